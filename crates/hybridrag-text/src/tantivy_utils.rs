use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

pub const TEXT_FIELD: &str = "text";
pub const POSITION_FIELD: &str = "position";
pub const TOKENIZER: &str = "chunk_whitespace";

/// `text` carries term frequencies and field norms for BM25 but no positions:
/// ranking uses no proximity signal. `position` is the chunk's corpus index.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _text_field = schema_builder.add_text_field(TEXT_FIELD, text_options);
	let _position_field = schema_builder.add_u64_field(POSITION_FIELD, FAST);
	schema_builder.build()
}

/// Case-sensitive whitespace split, no stemming or stop words. Indexed text is
/// whitespace-normalized first so it splits exactly like
/// `str::split_whitespace` on the query side.
pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
	index.tokenizers().register(TOKENIZER, tokenizer);
}
