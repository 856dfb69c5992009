use std::cmp::Reverse;
use std::fmt::Display;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::{doc, DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, SegmentReader, Term};

use hybridrag_core::error::{Error, Result};
use hybridrag_core::traits::Retriever;
use hybridrag_core::types::{Corpus, RetrievalResult, ScoredCandidate, Stage};

use crate::tantivy_utils::{build_schema, register_tokenizer, POSITION_FIELD, TEXT_FIELD};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

fn index_err(e: impl Display) -> Error {
	Error::Operation(format!("lexical index: {e}"))
}

// The tokenizer splits on ASCII whitespace only; queries split on any
// Unicode whitespace. Folding every whitespace run to one space keeps terms
// next to NBSP or em spaces matchable.
fn normalize_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Okapi BM25 over an in-memory tantivy index of the corpus.
pub struct LexicalIndex {
	corpus: Corpus,
	reader: IndexReader,
	text_field: Field,
}

impl LexicalIndex {
	pub fn build(corpus: Corpus) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let text_field = schema.get_field(TEXT_FIELD).map_err(index_err)?;
		let position_field = schema.get_field(POSITION_FIELD).map_err(index_err)?;

		// One writer thread keeps the corpus in a single segment, in order.
		let mut index_writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET).map_err(index_err)?;
		for (position, chunk) in corpus.iter().enumerate() {
			let doc = doc!(
				text_field => normalize_whitespace(&chunk.text),
				position_field => position as u64,
			);
			index_writer.add_document(doc).map_err(index_err)?;
		}
		index_writer.commit().map_err(index_err)?;

		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(index_err)?;
		tracing::info!(chunks = corpus.len(), "lexical index built");
		Ok(Self { corpus, reader, text_field })
	}

	fn term_query(&self, query: &str) -> Option<BooleanQuery> {
		let clauses: Vec<(Occur, Box<dyn Query>)> = query
			.split_whitespace()
			.map(|token| {
				let term = Term::from_field_text(self.text_field, token);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		if clauses.is_empty() { None } else { Some(BooleanQuery::new(clauses)) }
	}
}

impl Retriever for LexicalIndex {
	fn kind(&self) -> Stage {
		Stage::Lexical
	}

	fn len(&self) -> usize {
		self.corpus.len()
	}

	fn search(&self, query: &str, k: usize) -> Result<RetrievalResult> {
		if k == 0 || self.corpus.is_empty() {
			return Ok(RetrievalResult::empty());
		}
		let Some(bm25) = self.term_query(query) else {
			return Ok(RetrievalResult::empty());
		};

		// Equal BM25 scores fall back to corpus order: the collector ranks by
		// (score, earlier position) so the top-k cut is stable too.
		let collector = TopDocs::with_limit(k).tweak_score(move |segment_reader: &SegmentReader| {
			let positions = segment_reader.fast_fields().u64(POSITION_FIELD).ok();
			move |doc: DocId, score: Score| {
				let position = positions.as_ref().and_then(|column| column.first(doc)).unwrap_or(u64::MAX);
				(score, Reverse(position))
			}
		});
		let searcher = self.reader.searcher();
		let mut top_docs = searcher.search(&bm25, &collector).map_err(index_err)?;
		top_docs.sort_by(|(a, _), (b, _)| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

		let mut hits = Vec::with_capacity(top_docs.len());
		for ((score, Reverse(position)), _address) in top_docs {
			let chunk = usize::try_from(position)
				.ok()
				.and_then(|p| self.corpus.get(p))
				.ok_or_else(|| index_err(format!("document without corpus position {position}")))?;
			hits.push(ScoredCandidate::new(chunk.clone(), score, Stage::Lexical));
		}
		tracing::debug!(query, hits = hits.len(), "lexical search");
		Ok(RetrievalResult::new(hits))
	}
}
