//! Move routines under test: the trusted oracle and the candidates.
//!
//! A routine moves `len` bytes from `src` to `dest` within one buffer and
//! must be correct for every overlap configuration: `src < dest`,
//! `src > dest`, `src == dest`, and disjoint regions. The harness treats
//! every routine opaquely; it only distinguishes which one is the oracle.
//!
//! Bounds are the caller's responsibility: the sweep rejects any case
//! whose regions do not fit the buffer before invoking a routine, and
//! slice indexing panics on a harness bug rather than reading out of
//! bounds.

/// Capability implemented by the reference routine and every candidate.
pub trait MoveRoutine {
    /// Short stable identifier, used in reports and artifacts.
    fn name(&self) -> &'static str;

    /// Move `len` bytes from `buf[src..src+len]` to `buf[dest..dest+len]`,
    /// correct under arbitrary overlap.
    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize);
}

/// Trusted oracle: `slice::copy_within`, the standard library's
/// overlap-correct move.
pub struct Reference;

impl MoveRoutine for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize) {
        buf.copy_within(src..src + len, dest);
    }
}

/// Direction-aware byte-at-a-time loop, the classic hand-written memmove.
pub struct Bytewise;

impl MoveRoutine for Bytewise {
    fn name(&self) -> &'static str {
        "bytewise"
    }

    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize) {
        if dest == src || len == 0 {
            return;
        }
        if dest < src {
            for i in 0..len {
                buf[dest + i] = buf[src + i];
            }
        } else {
            // Destination past source: copy backward so un-read source
            // bytes are never overwritten first.
            for i in (0..len).rev() {
                buf[dest + i] = buf[src + i];
            }
        }
    }
}

/// Direction-aware word-at-a-time loop with byte head/tail handling.
pub struct Word;

const WORD: usize = std::mem::size_of::<usize>();

impl MoveRoutine for Word {
    fn name(&self) -> &'static str {
        "word"
    }

    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize) {
        if dest == src || len == 0 {
            return;
        }
        let dist = if dest > src { dest - src } else { src - dest };
        // Word-sized steps are only safe when the regions are at least a
        // word apart; otherwise a word read would cover bytes the
        // previous word write just changed.
        if len < WORD || dist < WORD {
            Bytewise.invoke(buf, dest, src, len);
            return;
        }

        let words = len / WORD;
        let tail = words * WORD;
        if dest < src {
            for w in 0..words {
                let off = w * WORD;
                copy_word(buf, dest + off, src + off);
            }
            for i in tail..len {
                buf[dest + i] = buf[src + i];
            }
        } else {
            for i in (tail..len).rev() {
                buf[dest + i] = buf[src + i];
            }
            for w in (0..words).rev() {
                let off = w * WORD;
                copy_word(buf, dest + off, src + off);
            }
        }
    }
}

#[inline(always)]
fn copy_word(buf: &mut [u8], dest: usize, src: usize) {
    let mut w = [0u8; WORD];
    w.copy_from_slice(&buf[src..src + WORD]);
    buf[dest..dest + WORD].copy_from_slice(&w);
}

/// The platform memmove: `core::ptr::copy` lowers to the libc routine.
pub struct StdPtr;

impl MoveRoutine for StdPtr {
    fn name(&self) -> &'static str {
        "stdptr"
    }

    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize) {
        // Force the bounds panic a slice copy would give before the raw
        // pointer move.
        let _ = &buf[src..src + len];
        let _ = &buf[dest..dest + len];
        unsafe {
            std::ptr::copy(buf.as_ptr().add(src), buf.as_mut_ptr().add(dest), len);
        }
    }
}

/// All built-in candidates, in report order.
pub fn builtin_candidates() -> Vec<Box<dyn MoveRoutine>> {
    vec![Box::new(Bytewise), Box::new(Word), Box::new(StdPtr)]
}

/// Look up a candidate (or the reference) by its report name.
pub fn candidate_by_name(name: &str) -> Option<Box<dyn MoveRoutine>> {
    match name {
        "reference" => Some(Box::new(Reference)),
        "bytewise" => Some(Box::new(Bytewise)),
        "word" => Some(Box::new(Word)),
        "stdptr" => Some(Box::new(StdPtr)),
        _ => None,
    }
}
