pub mod label_map_store;
pub mod lbp_face_recognizer;
