use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Pad (or truncate) each row to a specific length, typically to correlate with tokenized
/// sequences or with a stacked label layout
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: Vec<Vec<usize>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = tokens_list.len();

    let mut values = Vec::with_capacity(batch_size * seq_length);

    for mut tokens in tokens_list {
        tokens.resize(seq_length, pad_token);

        values.extend(tokens.into_iter().map(|e| (e as i64).elem::<B::IntElem>()));
    }

    Tensor::from_data(
        Data::new(values, Shape::new([batch_size, seq_length])),
        device,
    )
}

/// Read an integer tensor back as a flat list of ids, in row-major order. Negative values are
/// returned as `Err` with the offending value so callers can report which id had no meaning.
pub fn to_ids<B: Backend, const D: usize>(tensor: Tensor<B, D, Int>) -> Result<Vec<usize>, i64> {
    tensor
        .into_data()
        .convert::<i64>()
        .value
        .into_iter()
        .map(|id| usize::try_from(id).map_err(|_| id))
        .collect()
}
