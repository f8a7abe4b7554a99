/// BERT variants
pub mod bert;
