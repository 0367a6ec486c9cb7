#![allow(missing_docs)]

use proptest::prelude::*;
use stanza::{
    EmbeddingMatrix,
    Embeddings,
    Vocab,
    ann::LshOptions,
    io::{load_npy_path, load_vocab_path},
};

fn what_a_show() -> Embeddings {
    let mut vocab = Vocab::with_unk("unk");
    vocab.update("what a show".split_whitespace()).unwrap();
    let matrix = EmbeddingMatrix::new(4, 3, (0..12).map(|x| x as f32).collect()).unwrap();
    Embeddings::new(matrix, vocab).unwrap()
}

#[test]
fn test_save_load_bit_exact() {
    let mut vocab = Vocab::with_unk("<unk>");
    vocab
        .update("the quick brown fox jumps over the lazy dog the end".split_whitespace())
        .unwrap();
    let vocab = vocab.sort_by_decreasing_count();

    let data: Vec<f32> = (0..vocab.len() * 5)
        .map(|i| (i as f32 * 0.377).sin() / 3.0 + f32::EPSILON * i as f32)
        .collect();
    let emb = Embeddings::new(EmbeddingMatrix::new(vocab.len(), 5, data).unwrap(), vocab).unwrap();

    let dir = tempdir::TempDir::new("embeddings_it").unwrap();
    let prefix = dir.path().join("nested.name.emb");
    emb.save(&prefix).unwrap();

    let loaded = Embeddings::load(&prefix).unwrap();
    assert_eq!(loaded.vocab(), emb.vocab());
    assert_eq!(loaded.vocab().count("the"), 3);
    let bits = |e: &Embeddings| {
        e.matrix()
            .as_slice()
            .iter()
            .map(|x| x.to_bits())
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&loaded), bits(&emb));

    // The two artifacts are independently readable.
    let matrix = load_npy_path(dir.path().join("nested.name.emb.npy")).unwrap();
    assert_eq!(matrix.rows(), emb.len());
    let vocab = load_vocab_path(dir.path().join("nested.name.emb.vocab")).unwrap();
    assert_eq!(&vocab, emb.vocab());
}

#[test]
fn test_load_mismatched_artifacts() {
    let emb = what_a_show();
    let dir = tempdir::TempDir::new("embeddings_it").unwrap();
    let prefix = dir.path().join("emb");
    emb.save(&prefix).unwrap();

    let other = emb.subset(["a"]).unwrap();
    stanza::io::save_vocab_path(other.vocab(), dir.path().join("emb.vocab")).unwrap();

    assert!(matches!(
        Embeddings::load(&prefix),
        Err(stanza::StanzaError::ShapeMismatch(_))
    ));
}

#[test]
fn test_subset_scenario() {
    let emb = what_a_show();
    let sub = emb.subset(["a", "what"]).unwrap();

    assert_eq!(sub.vocab().words(), &["unk", "a", "what"]);
    let counts = sub.vocab().counts();
    assert_eq!(counts["unk"], 0);
    assert_eq!(counts["a"], 1);
    assert_eq!(counts["what"], 1);
    for word in ["unk", "a", "what"] {
        assert_eq!(sub.lookup(word).unwrap(), emb.lookup(word).unwrap());
    }
}

#[test]
fn test_approx_matches_exact_on_separated_data() {
    // Two tight clusters pointing in opposite directions.
    let mut vocab = Vocab::default();
    let mut rows = Vec::new();
    for i in 0..20 {
        let jitter = i as f32 * 0.01;
        vocab.add(&format!("pos{i}"), 1).unwrap();
        rows.push(vec![1.0, jitter, 0.5]);
        vocab.add(&format!("neg{i}"), 1).unwrap();
        rows.push(vec![-1.0, -jitter, -0.5]);
    }
    let emb = Embeddings::new(EmbeddingMatrix::from_rows(rows).unwrap(), vocab)
        .unwrap()
        .with_ann_options(LshOptions::default().with_num_bits(6).with_seed(11));

    let hits = emb.k_nearest_approx(&[1.0, 0.0, 0.5], 5).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.len() <= 5);
    for hit in &hits {
        assert!(hit.token.starts_with("pos"), "{hit:?}");
        assert!(hit.score > 0.9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn k_nearest_agrees_with_sorted_inner_products(
        values in proptest::collection::vec(-100i32..100, 3..60),
        query in proptest::collection::vec(-5i32..5, 3),
        k in 0usize..25,
    ) {
        let rows = values.len() / 3;
        let data: Vec<f32> = values[..rows * 3].iter().map(|&v| v as f32).collect();
        let vocab = Vocab::from_words((0..rows).map(|i| format!("w{i}")), None);
        let emb = Embeddings::new(EmbeddingMatrix::new(rows, 3, data).unwrap(), vocab).unwrap();
        let query: Vec<f32> = query.iter().map(|&v| v as f32).collect();

        let mut expected: Vec<(String, f32)> = emb.inner_products(&query).unwrap().into_iter().collect();
        expected.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then(emb.vocab().get(&a.0).cmp(&emb.vocab().get(&b.0)))
        });
        expected.truncate(k);

        let actual: Vec<(String, f32)> = emb
            .k_nearest(&query, k)
            .unwrap()
            .into_iter()
            .map(|n| (n.token, n.score))
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
