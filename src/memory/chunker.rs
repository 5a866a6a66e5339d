use std::iter::{FusedIterator, Peekable};

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// Trimmed, non-empty sentences of `text`. A run of terminators (`?!`,
/// `...`) closes one sentence and stays attached to it. A run with no
/// text before it is not a sentence.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    rest: &'a str,
}

impl<'a> Sentences<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.rest.is_empty() {
            let end = match self.rest.find(is_terminator) {
                Some(start) => self.rest[start..]
                    .find(|ch: char| !is_terminator(ch))
                    .map_or(self.rest.len(), |offset| start + offset),
                None => self.rest.len(),
            };

            let (sentence, rest) = self.rest.split_at(end);
            self.rest = rest;

            let sentence = sentence.trim();
            if !sentence.trim_matches(is_terminator).trim().is_empty() {
                return Some(sentence);
            }
        }
        None
    }
}

impl FusedIterator for Sentences<'_> {}

/// Greedy sentence packer. Yields chunks of at most `max_len` characters,
/// except a single sentence longer than `max_len`, which is yielded whole.
#[derive(Debug, Clone)]
pub struct SentenceChunks<'a> {
    sentences: Peekable<Sentences<'a>>,
    max_len: usize,
}

impl<'a> SentenceChunks<'a> {
    pub fn new(text: &'a str, max_len: usize) -> Self {
        Self {
            sentences: Sentences::new(text).peekable(),
            max_len,
        }
    }
}

impl Iterator for SentenceChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.sentences.next()?;
        let mut buffer = first.to_string();
        let mut buffer_len = char_count(first);

        while let Some(next) = self.sentences.peek() {
            let next_len = char_count(next);
            if buffer_len + 1 + next_len > self.max_len {
                break;
            }
            buffer.push(' ');
            buffer.push_str(next);
            buffer_len += 1 + next_len;
            self.sentences.next();
        }

        Some(buffer)
    }
}

impl FusedIterator for SentenceChunks<'_> {}

/// Split `text` into sentence-respecting chunks of at most `max_len` chars.
#[must_use]
pub fn chunk(text: &str, max_len: usize) -> SentenceChunks<'_> {
    SentenceChunks::new(text, max_len)
}
