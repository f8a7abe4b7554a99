use bert_burn::model::BertModelConfig;
use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
use burn_multitask::{
    models::bert::multi_task::Config,
    pipelines::multi_task::{evaluate, Batch, Batcher, Item, LabelSet, LabelSpace, Model, IC},
    utils::tensors::to_ids,
};
use pretty_assertions::assert_eq;

type TestBackend = NdArray;

fn labels() -> LabelSpace {
    LabelSpace::new(
        LabelSet::from_labels(IC, &["greet", "book"]),
        vec![
            LabelSet::from_labels("coarse", &["O", "B-ENT", "I-ENT"]),
            LabelSet::from_labels("medium", &["O", "B-PLACE", "I-PLACE"]),
            LabelSet::from_labels("fine", &["O", "B-CITY", "I-CITY", "B-ROOM"]),
        ],
    )
    .unwrap()
}

fn config() -> Config {
    let bert = BertModelConfig::new(2, 1, 1e-12, 16, 32, 64, 16, 1, 0.0, "bert".to_string(), 0)
        .with_max_seq_len(Some(6))
        .with_with_pooling_layer(Some(false));

    Config::new("tiny-bert".to_string(), bert, labels())
        .with_proj_dim(8)
        .with_num_heads(2)
}

fn item(token_ids: Vec<usize>, intent: &str, tags: [&[&str]; 3]) -> Item {
    Item::new(
        token_ids,
        intent.to_string(),
        tags.iter()
            .map(|level| level.iter().map(|tag| tag.to_string()).collect())
            .collect(),
    )
}

fn batch() -> Batch<TestBackend> {
    let batcher = Batcher::<TestBackend>::new(&labels(), 6, 0, Default::default());

    batcher.batch(vec![
        item(
            vec![2, 17, 33, 3],
            "book",
            [
                &["O", "B-ENT", "I-ENT", "O"],
                &["O", "B-PLACE", "I-PLACE", "O"],
                &["O", "B-CITY", "I-CITY", "O"],
            ],
        ),
        item(
            vec![2, 9, 3],
            "greet",
            [&["O", "O", "O"], &["O", "O", "O"], &["O", "O", "O"]],
        ),
    ])
}

#[test]
fn test_predictions_from_a_randomly_initialized_model() {
    let _ = pretty_env_logger::try_init();

    let device = Default::default();
    let model = config().init::<TestBackend>(&device).unwrap();

    let predictions = model.infer(batch().input).unwrap().argmax();

    let intents = to_ids(predictions.ic).unwrap();
    assert_eq!(intents.len(), 2);
    assert!(intents.iter().all(|&id| id < 2));

    for (tags, set) in predictions.ner.into_iter().zip(&labels().levels) {
        assert_eq!(tags.dims(), [2, 6]);
        assert!(to_ids(tags).unwrap().iter().all(|&id| id < set.len()));
    }
}

#[test]
fn test_evaluate_a_randomly_initialized_model() {
    let _ = pretty_env_logger::try_init();

    let device = Default::default();
    let labels = labels();
    let model = config().init::<TestBackend>(&device).unwrap();

    let first = evaluate(&model, &labels, vec![batch()], &["en", "de"]).unwrap();
    let second = evaluate(&model, &labels, vec![batch()], &["en", "de"]).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.languages.len(), 2);
    assert_eq!(first.global.levels.len(), 3);
    assert!((0.0..=1.0).contains(&first.global.accuracy_ic));
    assert!((0.0..=1.0).contains(&first.global.f1_ner));
}
