use std::hash::Hash;

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Build an id-to-label map from an ordered list of labels, where each id is the label's index
pub fn enumerate_labels<S: AsRef<str>>(labels: &[S]) -> std::collections::BTreeMap<usize, String> {
    labels
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| (i, s.to_string()))
        .collect()
}
