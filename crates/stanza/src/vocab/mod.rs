//! # Vocabulary
//!
//! This module provides [`Vocab`], a bijection between token strings and
//! dense ids ``0..N`` with an occurrence count per token.
//!
//! ## Id Assignment
//!
//! Ids are assigned in insertion order, with no gaps and no reuse.
//! When an unknown token is configured it is always id 0, and
//! [`Vocab::lookup`] falls back to it for absent tokens.
//!
//! ## Derived Vocabularies
//!
//! [`Vocab::prune_rares`], [`Vocab::sort_by_decreasing_count`] and
//! [`Vocab::subset`] never mutate the receiver; they return a new [`Vocab`]
//! with a freshly assigned id space. Ids must not be mixed across the two.
//!
//! ## Freezing
//!
//! Once an embedding matrix has been built against a vocabulary, its id space
//! must not drift. [`Vocab::freeze`] makes every later [`Vocab::add`] or
//! [`Vocab::update`] fail with [`crate::StanzaError::FrozenVocabulary`].

mod derived;
mod token_vocab;
pub mod validators;

#[doc(inline)]
pub use token_vocab::{Vocab, VocabIter};
