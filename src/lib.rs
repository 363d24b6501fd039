//! plate-reader - license-plate text recovery for gate automation
//!
//! Recovers normalized plate text from a cropped plate image by fusing
//! several fallible recognition sources: a character classifier
//! re-invoked over multiple preprocessed renderings of each character
//! crop, with a generic OCR engine as fallback, arbitrated by a
//! plate-format scorer. The engine owns no models; detector, classifier
//! and OCR are injected behind traits and every collaborator failure
//! degrades to a smaller candidate pool, never an error.
//!
//! ```no_run
//! use plate_reader::{PlateReader, CharacterClassifier, TextRecognizer};
//!
//! # fn demo<C: CharacterClassifier, R: TextRecognizer>(classifier: C, ocr: R, plate: image::DynamicImage) {
//! let reader = PlateReader::new(classifier, ocr);
//! let read = reader.read_plate(&plate);
//! println!("plate: '{}' ({} characters)", read.text, read.characters.len());
//! # }
//! ```

pub mod capabilities;
pub mod charset;
pub mod config;
pub mod gate;
pub mod vision;

pub use capabilities::{
    CharacterClassifier, Detection, Geometry, OcrMode, PlateDetector, TextRecognizer,
};
pub use config::{load_config, save_config, EngineConfig};
pub use gate::{GateDecision, GatePolicy, GateReason};
pub use vision::{
    locate_plate, CharacterRead, LocatedPlate, PlateReadResult, PlateReader, PlateScorer,
};
