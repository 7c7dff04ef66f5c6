pub mod backend;
pub mod chess_com;
