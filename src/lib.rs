pub mod clipboard;
pub mod config;
pub mod dictionary;
pub mod document;
pub mod editor;
pub mod html;
pub mod render;
pub mod shortcuts;
pub mod storage;
