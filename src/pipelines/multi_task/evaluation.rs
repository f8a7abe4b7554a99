//! Decode model outputs over an evaluation set into intent and entity metrics, globally and for
//! each language.

use std::collections::BTreeMap;

use burn::tensor::{backend::Backend, Int, Tensor};
use serde::{Deserialize, Serialize};

use crate::{
    metrics::{
        classification::{accuracy, macro_f1},
        entities::{score, EntityScores},
    },
    utils::tensors::to_ids,
};

use super::{Batch, Error, LabelSet, LabelSpace, Model, IC};

/// Intent and entity metrics for a set of examples
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Exact-match rate of intent predictions
    #[serde(rename = "accuracy_IC")]
    pub accuracy_ic: f64,

    /// Macro-averaged intent F1
    #[serde(rename = "f1_IC")]
    pub f1_ic: f64,

    /// Entity-level F1 pooled over every tag level
    #[serde(rename = "f1_NER")]
    pub f1_ner: f64,

    /// Entity-level precision pooled over every tag level
    #[serde(rename = "precision_NER")]
    pub precision_ner: f64,

    /// Entity-level recall pooled over every tag level
    #[serde(rename = "recall_NER")]
    pub recall_ner: f64,

    /// Entity-level scores for each tag level
    pub levels: BTreeMap<String, EntityScores>,
}

/// Global metrics plus metrics for every language present in the evaluation set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "L: Deserialize<'de> + Ord"))]
pub struct Evaluation<L> {
    /// Metrics over all examples
    pub global: Metrics,

    /// Metrics restricted to the examples of each language
    pub languages: BTreeMap<L, Metrics>,
}

/// Gold and predicted labels collected batch by batch. Tags are decoded to strings borrowed from
/// the label space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accumulator<'a> {
    /// Gold intent ids
    pub ic_labels: Vec<usize>,

    /// Predicted intent ids
    pub ic_output: Vec<usize>,

    /// Gold tags, indexed by example then tag level
    pub ner_labels: Vec<Vec<Vec<&'a str>>>,

    /// Predicted tags, indexed by example then tag level
    pub ner_output: Vec<Vec<Vec<&'a str>>>,
}

impl<'a> Accumulator<'a> {
    /// The number of accumulated examples
    pub fn len(&self) -> usize {
        self.ic_labels.len()
    }

    /// Whether no examples have been accumulated
    pub fn is_empty(&self) -> bool {
        self.ic_labels.is_empty()
    }

    /// Run the model over one batch and decode its labels and predictions
    pub fn push<B: Backend, M: Model<B>>(
        &mut self,
        model: &M,
        labels: &'a LabelSpace,
        batch: Batch<B>,
    ) -> Result<(), Error> {
        let layout = labels.layout(model.positions());
        batch.validate(&layout)?;

        let batch_size = batch.len();
        let positions = layout.positions;

        let Batch { input, labels: gold } = batch;

        let output = model.infer(input)?;

        let [ic_batch_size, n_intents] = output.ic.dims();

        Error::check_dim("ner_levels", 0, labels.levels.len(), output.ner.len())?;
        Error::check_dim("ic_logits", 0, batch_size, ic_batch_size)?;
        Error::check_dim("ic_logits", 1, labels.intents.len(), n_intents)?;
        for (set, logits) in labels.levels.iter().zip(&output.ner) {
            let [logits_batch_size, logits_positions, n_tags] = logits.dims();

            Error::check_dim("ner_logits", 0, batch_size, logits_batch_size)?;
            Error::check_dim("ner_logits", 1, positions, logits_positions)?;
            Error::check_dim("ner_logits", 2, set.len(), n_tags)?;
        }

        let predictions = output.argmax();

        let ic_labels = decode_ids(gold.clone().slice([0..batch_size, layout.intent()]), IC)?;
        let ic_output = decode_ids(predictions.ic, IC)?;

        let mut ner_labels = vec![Vec::with_capacity(labels.levels.len()); batch_size];
        let mut ner_output = vec![Vec::with_capacity(labels.levels.len()); batch_size];

        for (level, (set, predicted)) in labels.levels.iter().zip(predictions.ner).enumerate() {
            let gold_ids = decode_ids(
                gold.clone().slice([0..batch_size, layout.level(level)]),
                &set.name,
            )?;
            let predicted_ids = decode_ids(predicted, &set.name)?;

            let rows = gold_ids.chunks(positions).zip(predicted_ids.chunks(positions));
            for (example, (gold_row, predicted_row)) in rows.enumerate() {
                ner_labels[example].push(decode_tags(set, gold_row)?);
                ner_output[example].push(decode_tags(set, predicted_row)?);
            }
        }

        self.ic_labels.extend(ic_labels);
        self.ic_output.extend(ic_output);
        self.ner_labels.extend(ner_labels);
        self.ner_output.extend(ner_output);

        Ok(())
    }

    /// Append the examples of another accumulator, such as one filled by a separate worker
    pub fn merge(&mut self, other: Accumulator<'a>) {
        self.ic_labels.extend(other.ic_labels);
        self.ic_output.extend(other.ic_output);
        self.ner_labels.extend(other.ner_labels);
        self.ner_output.extend(other.ner_output);
    }

    /// Check that every example holds labels and predictions for each tag level
    fn check_levels(&self, labels: &LabelSpace) -> Result<(), Error> {
        let examples = self.len();

        Error::check_dim("ic_output", 0, examples, self.ic_output.len())?;
        Error::check_dim("ner_labels", 0, examples, self.ner_labels.len())?;
        Error::check_dim("ner_output", 0, examples, self.ner_output.len())?;

        let levels = labels.levels.len();
        for (gold, predicted) in self.ner_labels.iter().zip(&self.ner_output) {
            Error::check_dim("ner_labels", 1, levels, gold.len())?;
            Error::check_dim("ner_output", 1, levels, predicted.len())?;
        }

        Ok(())
    }

    /// Compute metrics for the examples at the given indices, which must be in range
    fn metrics(&self, labels: &LabelSpace, indices: &[usize]) -> Result<Metrics, Error> {
        let ic_labels: Vec<usize> = indices.iter().map(|&i| self.ic_labels[i]).collect();
        let ic_output: Vec<usize> = indices.iter().map(|&i| self.ic_output[i]).collect();

        let mut levels = BTreeMap::new();
        let mut all_output = Vec::with_capacity(indices.len() * labels.levels.len());
        let mut all_labels = Vec::with_capacity(indices.len() * labels.levels.len());

        for (level, set) in labels.levels.iter().enumerate() {
            let output: Vec<_> = indices
                .iter()
                .map(|&i| self.ner_output[i][level].clone())
                .collect();
            let gold: Vec<_> = indices
                .iter()
                .map(|&i| self.ner_labels[i][level].clone())
                .collect();

            levels.insert(set.name.clone(), score(&output, &gold)?);

            all_output.extend(output);
            all_labels.extend(gold);
        }

        let ner = score(&all_output, &all_labels)?;

        Ok(Metrics {
            accuracy_ic: accuracy(&ic_labels, &ic_output),
            f1_ic: macro_f1(&ic_labels, &ic_output),
            f1_ner: ner.f1,
            precision_ner: ner.precision,
            recall_ner: ner.recall,
            levels,
        })
    }

    /// Compute global metrics, then metrics for each distinct language. `languages` must hold one
    /// entry per accumulated example, in the same order.
    pub fn summarize<L: Ord + Clone>(
        &self,
        labels: &LabelSpace,
        languages: &[L],
    ) -> Result<Evaluation<L>, Error> {
        if self.is_empty() {
            return Err(Error::EmptyEvaluation);
        }

        if languages.len() != self.len() {
            return Err(Error::LanguageCount {
                expected: self.len(),
                found: languages.len(),
            });
        }

        self.check_levels(labels)?;

        log::info!("Compute global metrics:");

        let all: Vec<usize> = (0..self.len()).collect();
        let global = self.metrics(labels, &all)?;

        log::info!("Compute language-wise metrics:");

        let mut by_language: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
        for (i, language) in languages.iter().enumerate() {
            by_language.entry(language).or_default().push(i);
        }

        let languages = by_language
            .into_iter()
            .map(|(language, indices)| Ok((language.clone(), self.metrics(labels, &indices)?)))
            .collect::<Result<BTreeMap<_, _>, Error>>()?;

        Ok(Evaluation { global, languages })
    }
}

/// Run the model over every batch and compute global and per-language metrics.
///
/// The model should be on a backend without autodiff (e.g. `model.valid()`), so no gradients are
/// tracked. `languages` is aligned with the concatenated examples of all batches. Any failing
/// batch aborts the whole evaluation.
pub fn evaluate<B, M, I, L>(
    model: &M,
    labels: &LabelSpace,
    batches: I,
    languages: &[L],
) -> Result<Evaluation<L>, Error>
where
    B: Backend,
    M: Model<B>,
    I: IntoIterator<Item = Batch<B>>,
    L: Ord + Clone,
{
    labels.validate()?;

    log::info!("Stack predictions:");

    let mut accumulator = Accumulator::default();
    for (i, batch) in batches.into_iter().enumerate() {
        log::debug!("Evaluating batch {} ({} examples)", i, batch.len());

        accumulator.push(model, labels, batch)?;
    }

    accumulator.summarize(labels, languages)
}

fn decode_ids<B: Backend, const D: usize>(
    tensor: Tensor<B, D, Int>,
    level: &str,
) -> Result<Vec<usize>, Error> {
    to_ids(tensor).map_err(|id| Error::Decoding {
        level: level.to_string(),
        id,
    })
}

fn decode_tags<'a>(set: &'a LabelSet, ids: &[usize]) -> Result<Vec<&'a str>, Error> {
    ids.iter().map(|&id| set.decode(id)).collect()
}
