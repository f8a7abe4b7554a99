use std::collections::BTreeSet;

/// The fraction of predictions that exactly match the gold label. Empty input scores 0.
pub fn accuracy(gold: &[usize], predicted: &[usize]) -> f64 {
    if gold.is_empty() {
        return 0.0;
    }

    let correct = gold
        .iter()
        .zip(predicted)
        .filter(|(gold, predicted)| gold == predicted)
        .count();

    correct as f64 / gold.len() as f64
}

/// Unweighted mean of per-class F1 over every class seen in either the gold or predicted labels.
///
/// A class that is never predicted (or never gold) has precision (or recall) 0, and a class with
/// both at 0 contributes an F1 of 0 to the mean.
pub fn macro_f1(gold: &[usize], predicted: &[usize]) -> f64 {
    let classes: BTreeSet<usize> = gold.iter().chain(predicted).copied().collect();

    if classes.is_empty() {
        return 0.0;
    }

    let total: f64 = classes
        .iter()
        .map(|&class| {
            let mut true_positives = 0usize;
            let mut false_positives = 0usize;
            let mut false_negatives = 0usize;

            for (&g, &p) in gold.iter().zip(predicted) {
                match (g == class, p == class) {
                    (true, true) => true_positives += 1,
                    (false, true) => false_positives += 1,
                    (true, false) => false_negatives += 1,
                    (false, false) => {}
                }
            }

            let denominator = 2 * true_positives + false_positives + false_negatives;
            if denominator == 0 {
                0.0
            } else {
                (2 * true_positives) as f64 / denominator as f64
            }
        })
        .sum();

    total / classes.len() as f64
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 2], &[0, 1, 1, 2]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_macro_f1_counts_each_class_equally() {
        // Class 0: p=0.5, r=1.0 -> f1=2/3. Class 1: never predicted -> f1=0.
        let f1 = macro_f1(&[0, 1], &[0, 0]);

        assert!((f1 - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_macro_f1_includes_predicted_only_classes() {
        // Class 2 only appears in predictions, so it drags the mean down
        let f1 = macro_f1(&[0, 0, 1], &[0, 0, 2]);

        assert!((f1 - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_macro_f1_perfect() {
        assert_eq!(macro_f1(&[3, 1, 4, 1], &[3, 1, 4, 1]), 1.0);
    }
}
