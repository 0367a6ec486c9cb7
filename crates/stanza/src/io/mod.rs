//! # Vocabulary and Matrix IO
//!
//! ## Vocabulary Files
//!
//! One entry per line, in id order; the line index is the id:
//! ```terminaloutput
//! %vocab	unk	<unk>
//! <unk>	0
//! the	1061396
//! ,	1051722
//! ```
//! The ``%vocab`` header is only written when the vocabulary has an unknown
//! token. Tokens may not contain tabs or line breaks.
//!
//! ## Matrix Files
//!
//! Matrices are stored in the ``NumPy`` ``.npy`` format (version 1.0,
//! little-endian ``<f4``, C order), so they can be read with ``numpy.load``.
//!
//! ## Saving and Loading
//!
//! ```rust,no_run
//! use stanza::{Vocab, io::{load_vocab_path, save_vocab_path}};
//!
//! fn example() -> stanza::StanzaResult<()> {
//!     let mut vocab = Vocab::with_unk("<unk>");
//!     vocab.update(["a", "b", "a"])?;
//!
//!     save_vocab_path(&vocab, "corpus.vocab")?;
//!     assert_eq!(load_vocab_path("corpus.vocab")?, vocab);
//!     Ok(())
//! }
//! ```

mod atomic;
mod npy;
mod vocab_io;

#[doc(inline)]
pub use atomic::write_file_atomic;
#[doc(inline)]
pub use npy::{load_npy_path, read_npy_matrix, save_npy_path, write_npy_matrix};
pub(crate) use vocab_io::check_vocab_writable;
#[doc(inline)]
pub use vocab_io::{
    VOCAB_HEADER,
    load_vocab_path,
    read_vocab,
    read_vocab_with_unk,
    save_vocab_path,
    write_vocab,
};
