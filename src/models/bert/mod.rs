/// BERT for joint intent classification and hierarchical named entity recognition
pub mod multi_task;
