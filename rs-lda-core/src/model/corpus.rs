use std::collections::HashMap;

/// The token matrix a sampling run works on.
///
/// Documents are ordered sequences of terms. Each distinct term is interned
/// once to a dense id (in first-seen order) so that count tables can key on a
/// `usize` rather than cloning strings on every update. The strings come back
/// out in the estimates.
///
/// # Invariants
/// - Every id stored in `documents` is `< terms.len()`
/// - `index[terms[id]] == id` for every id
#[derive(Clone, Debug, Default)]
pub struct Corpus {
	/// Term ids, one row per document, in position order.
	documents: Vec<Vec<usize>>,
	/// Term strings indexed by id.
	terms: Vec<String>,
	/// Reverse lookup from term string to id.
	index: HashMap<String, usize>,
}

impl Corpus {
	/// Builds a corpus from an already tokenized token matrix.
	pub fn new(token_matrix: Vec<Vec<String>>) -> Self {
		let mut corpus = Self::default();
		for document in token_matrix {
			corpus.add_document(document);
		}
		corpus
	}

	/// Convenience constructor for borrowed tokens (tests, small demos).
	pub fn from_tokens<D, T>(token_matrix: &[D]) -> Self
	where
		D: AsRef<[T]>,
		T: AsRef<str>,
	{
		let mut corpus = Self::default();
		for document in token_matrix {
			corpus.add_document(document.as_ref().iter().map(|t| t.as_ref().to_owned()));
		}
		corpus
	}

	/// Appends one document, interning any unseen term.
	pub fn add_document<I: IntoIterator<Item = String>>(&mut self, tokens: I) {
		let row = tokens.into_iter().map(|term| self.intern(term)).collect();
		self.documents.push(row);
	}

	fn intern(&mut self, term: String) -> usize {
		if let Some(&id) = self.index.get(&term) {
			return id;
		}
		let id = self.terms.len();
		self.terms.push(term.clone());
		self.index.insert(term, id);
		id
	}

	/// Number of documents (M).
	pub fn len(&self) -> usize {
		self.documents.len()
	}

	/// `true` when the corpus holds no documents.
	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	/// Term ids of one document.
	///
	/// # Panics
	/// Panics if `doc` is out of range.
	pub fn document(&self, doc: usize) -> &[usize] {
		&self.documents[doc]
	}

	/// Iterates over every document's term ids in order.
	pub fn documents(&self) -> impl Iterator<Item = &[usize]> {
		self.documents.iter().map(Vec::as_slice)
	}

	/// Token count of document `doc`.
	pub fn document_len(&self, doc: usize) -> usize {
		self.documents[doc].len()
	}

	/// Term string for an id.
	///
	/// # Panics
	/// Panics if `id` was not produced by this corpus.
	pub fn term(&self, id: usize) -> &str {
		&self.terms[id]
	}

	/// Looks up the id of a term, if it occurs anywhere in the corpus.
	pub fn term_id(&self, term: &str) -> Option<usize> {
		self.index.get(term).copied()
	}

	/// Number of distinct terms actually observed.
	///
	/// Callers without an external vocabulary usually pass this as `V`.
	pub fn distinct_terms(&self) -> usize {
		self.terms.len()
	}

	/// Total number of tokens across all documents.
	pub fn total_tokens(&self) -> usize {
		self.documents.iter().map(Vec::len).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn interns_in_first_seen_order() {
		let corpus = Corpus::from_tokens(&[vec!["a", "b"], vec!["b", "c", "a"]]);
		assert_eq!(corpus.len(), 2);
		assert_eq!(corpus.distinct_terms(), 3);
		assert_eq!(corpus.document(0), &[0, 1]);
		assert_eq!(corpus.document(1), &[1, 2, 0]);
		assert_eq!(corpus.term(2), "c");
		assert_eq!(corpus.term_id("b"), Some(1));
		assert_eq!(corpus.term_id("z"), None);
		assert_eq!(corpus.total_tokens(), 5);
	}

	#[test]
	fn keeps_empty_documents() {
		let corpus = Corpus::new(vec![vec![], vec!["x".to_owned()]]);
		assert_eq!(corpus.len(), 2);
		assert_eq!(corpus.document_len(0), 0);
		assert_eq!(corpus.document_len(1), 1);
	}
}
