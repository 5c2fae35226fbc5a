// Byte and bit level readers shared by the box and frame parsers
pub mod bits;
pub mod io;
