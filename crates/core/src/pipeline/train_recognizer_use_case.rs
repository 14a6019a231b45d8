use crate::recognition::infrastructure::label_map_store;
use crate::recognition::infrastructure::lbp_face_recognizer::LbpFaceRecognizer;
use crate::shared::workspace_layout::WorkspaceLayout;

/// Trains the recognizer on every identity folder under the dataset
/// directory and stores the model and label map where the tracking tool
/// expects them. Returns the number of trained identities.
pub fn train_recognizer(layout: &WorkspaceLayout) -> Result<usize, Box<dyn std::error::Error>> {
    let dataset = layout.dataset();
    log::info!("Training recognizer from {}", dataset.display());
    let trained = LbpFaceRecognizer::train(&dataset)?;

    trained.recognizer.save(&layout.recognizer_model())?;
    label_map_store::save(&layout.label_map(), &trained.labels)?;
    log::info!(
        "Saved recognizer for {} identities to {}",
        trained.labels.len(),
        layout.recognizer_model().display()
    );
    Ok(trained.labels.len())
}
