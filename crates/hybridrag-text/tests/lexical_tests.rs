use hybridrag_core::traits::Retriever;
use hybridrag_core::types::{corpus_from, Chunk, Stage};
use hybridrag_text::LexicalIndex;

fn index_of(texts: &[(&str, &str)]) -> LexicalIndex {
    let chunks = texts.iter().map(|(text, source)| Chunk::new(*text, *source)).collect();
    LexicalIndex::build(corpus_from(chunks)).expect("build lexical index")
}

#[test]
fn bm25_ranks_by_term_frequency_and_skips_non_matching() {
    let index = index_of(&[
        ("the pump needs oil", "pump.txt"),
        ("oil oil oil change", "car.txt"),
        ("unrelated words here", "misc.txt"),
    ]);
    let hits = index.search("oil", 5).expect("search");

    assert_eq!(hits.texts(), vec!["oil oil oil change", "the pump needs oil"]);
    assert!(hits.iter().all(|h| h.stage == Stage::Lexical));
    let scores = hits.scores();
    assert!(scores[0] > scores[1], "scores = {scores:?}");
}

#[test]
fn equal_scores_keep_corpus_order() {
    let index = index_of(&[
        ("apple one", "a"),
        ("apple two", "b"),
        ("apple six", "c"),
    ]);
    let hits = index.search("apple", 2).expect("search");

    assert_eq!(hits.texts(), vec!["apple one", "apple two"]);
}

#[test]
fn result_length_is_bounded_by_k() {
    let index = index_of(&[("a b", "1"), ("a c", "2"), ("a d", "3")]);
    assert_eq!(index.search("a", 1).unwrap().len(), 1);
    assert_eq!(index.search("a", 10).unwrap().len(), 3);
    assert!(index.search("a", 0).unwrap().is_empty());
}

#[test]
fn empty_or_blank_query_returns_nothing() {
    let index = index_of(&[("some text", "1")]);
    assert!(index.search("", 5).unwrap().is_empty());
    assert!(index.search("   \t", 5).unwrap().is_empty());
}

#[test]
fn query_syntax_is_not_interpreted() {
    let index = index_of(&[("a \"quoted\" AND (weird) token:value", "1")]);
    let hits = index.search("token:value (weird)", 5).expect("raw tokens never fail to parse");
    assert_eq!(hits.len(), 1);
}

#[test]
fn tokens_are_case_sensitive() {
    let index = index_of(&[("Oil filter", "1")]);
    assert!(index.search("oil", 5).unwrap().is_empty());
    assert_eq!(index.search("Oil", 5).unwrap().len(), 1);
}

#[test]
fn empty_corpus_is_searchable() {
    let index = index_of(&[]);
    assert!(index.is_empty());
    assert!(index.search("anything", 3).unwrap().is_empty());
}

#[test]
fn hits_share_identity_with_corpus_chunks() {
    let chunks = vec![Chunk::new("alpha beta", "doc1"), Chunk::new("gamma", "doc2")];
    let corpus = corpus_from(chunks);
    let index = LexicalIndex::build(corpus.clone()).unwrap();
    let hits = index.search("gamma", 1).unwrap();

    assert!(std::sync::Arc::ptr_eq(&hits.candidates()[0].chunk, &corpus[1]));
}

#[test]
fn terms_next_to_unicode_whitespace_are_matchable() {
    let index = index_of(&[("pump\u{2003}oil change", "manual.txt"), ("bread", "kitchen.txt")]);

    let hits = index.search("oil", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits.candidates()[0].source(), "manual.txt");
    // the chunk keeps its original text
    assert_eq!(hits.texts(), vec!["pump\u{2003}oil change"]);

    assert_eq!(index.search("pump\u{a0}oil", 5).unwrap().len(), 1);
}
