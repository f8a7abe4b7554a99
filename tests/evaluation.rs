use burn::{
    backend::NdArray,
    data::dataloader::batcher::Batcher as _,
    tensor::{Data, Shape, Tensor},
};
use burn_multitask::{
    pipelines::multi_task::{
        evaluate, Batch, Batcher, Error, Evaluation, Infer, Item, LabelSet, LabelSpace, Model, Output, IC,
    },
    utils::tensors::to_ids,
};
use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

type TestBackend = NdArray;

const POSITIONS: usize = 5;

/// Reads predictions straight off the token ids: the first token is the intent, and every token
/// is the tag at its position for each level
struct Echo {
    n_intents: usize,
    n_tags: Vec<usize>,
}

fn one_hot(ids: &[usize], n: usize) -> Vec<f32> {
    ids.iter()
        .flat_map(|&id| (0..n).map(move |i| if i == id { 1.0 } else { 0.0 }))
        .collect()
}

impl Model<TestBackend> for Echo {
    fn positions(&self) -> usize {
        POSITIONS
    }

    fn infer(&self, input: Infer<TestBackend>) -> Result<Output<TestBackend>, Error> {
        let device = input.tokens.device();
        let [batch_size, positions] = input.tokens.dims();
        let tokens = to_ids(input.tokens).unwrap();

        let intents: Vec<usize> = tokens.chunks(positions).map(|row| row[0]).collect();
        let ic = Tensor::from_data(
            Data::new(
                one_hot(&intents, self.n_intents),
                Shape::new([batch_size, self.n_intents]),
            ),
            &device,
        );

        let ner = self
            .n_tags
            .iter()
            .map(|&n| {
                Tensor::from_data(
                    Data::new(one_hot(&tokens, n), Shape::new([batch_size, positions, n])),
                    &device,
                )
            })
            .collect();

        Ok(Output::new(ic, ner))
    }
}

fn labels() -> LabelSpace {
    LabelSpace::new(
        LabelSet::from_labels(IC, &["greet", "book", "cancel"]),
        vec![
            LabelSet::from_labels("coarse", &["O", "B-ENT", "I-ENT"]),
            LabelSet::from_labels("fine", &["O", "B-CITY", "I-CITY"]),
        ],
    )
    .unwrap()
}

fn tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

/// Items with a mix of correct and incorrect intents and tags
fn items() -> Vec<(Item, &'static str)> {
    let coarse = [
        ["O", "B-ENT", "I-ENT", "O"],
        ["B-ENT", "O", "O", "O"],
        ["O", "O", "B-ENT", "O"],
        ["O", "B-ENT", "O", "B-ENT"],
    ];
    let fine = [
        ["O", "B-CITY", "I-CITY", "O"],
        ["B-CITY", "O", "O", "O"],
        ["O", "O", "O", "O"],
        ["O", "B-CITY", "O", "O"],
    ];
    let tokens = [[0, 1, 2, 0], [1, 0, 0, 0], [2, 0, 1, 0], [0, 1, 1, 1]];
    let intents = ["greet", "book", "book", "cancel"];
    let languages = ["en", "de", "fr"];

    (0..12)
        .map(|i| {
            let item = Item::new(
                tokens[i % 4].to_vec(),
                intents[(i + i / 4) % 4].to_string(),
                vec![tags(&coarse[i % 4]), tags(&fine[(i + 1) % 4])],
            );

            (item, languages[i % 3])
        })
        .collect()
}

fn batches(batch_size: usize) -> Vec<(Batch<TestBackend>, Vec<&'static str>)> {
    let batcher = Batcher::<TestBackend>::new(&labels(), POSITIONS, 0, Default::default());

    items()
        .chunks(batch_size)
        .map(|chunk| {
            let languages = chunk.iter().map(|(_, language)| *language).collect();
            let items = chunk.iter().map(|(item, _)| item.clone()).collect();

            (batcher.batch(items), languages)
        })
        .collect()
}

fn run(batches: Vec<(Batch<TestBackend>, Vec<&'static str>)>) -> Evaluation<&'static str> {
    let labels = labels();
    let model = Echo {
        n_intents: 3,
        n_tags: vec![3, 3],
    };

    let (batches, languages): (Vec<_>, Vec<_>) = batches.into_iter().unzip();
    let languages: Vec<_> = languages.into_iter().flatten().collect();

    evaluate(&model, &labels, batches, &languages).unwrap()
}

#[test]
fn test_metrics_are_bounded() {
    let _ = pretty_env_logger::try_init();

    let evaluation = run(batches(4));

    assert_eq!(
        evaluation.languages.keys().copied().collect::<Vec<_>>(),
        vec!["de", "en", "fr"]
    );

    for metrics in std::iter::once(&evaluation.global).chain(evaluation.languages.values()) {
        for value in [
            metrics.accuracy_ic,
            metrics.f1_ic,
            metrics.f1_ner,
            metrics.precision_ner,
            metrics.recall_ner,
        ] {
            assert!((0.0..=1.0).contains(&value), "{} out of range", value);
        }

        assert_eq!(
            metrics.levels.keys().cloned().collect::<Vec<_>>(),
            vec!["coarse", "fine"]
        );
    }
}

#[test]
fn test_batch_order_does_not_change_metrics() {
    let _ = pretty_env_logger::try_init();

    let expected = run(batches(3));

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..3 {
        let mut shuffled = batches(3);
        shuffled.shuffle(&mut rng);

        assert_eq!(run(shuffled), expected);
    }
}

#[test]
fn test_batch_size_does_not_change_metrics() {
    let _ = pretty_env_logger::try_init();

    assert_eq!(run(batches(1)), run(batches(5)));
}

#[test]
fn test_serializes_to_json() {
    let evaluation = run(batches(4));

    let json = serde_json::to_value(&evaluation).unwrap();

    assert!(json["global"]["f1_NER"].is_number());
    assert!(json["languages"]["fr"]["accuracy_IC"].is_number());
    assert!(json["global"]["levels"]["fine"]["precision"].is_number());
}
