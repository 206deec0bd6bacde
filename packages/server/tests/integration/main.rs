mod gc;
mod image;
