pub mod face_recognizer;
pub mod identity_labeler;
pub mod label_map;
