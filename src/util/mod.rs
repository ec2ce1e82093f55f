pub mod bit_splitter;
