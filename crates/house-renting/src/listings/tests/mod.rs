mod common;
mod rental;
