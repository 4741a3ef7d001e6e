pub mod decode;
pub mod extract;
pub mod nobil;
pub mod tag_path;
