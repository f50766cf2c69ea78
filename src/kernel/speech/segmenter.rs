/// Characters that close a speakable sentence.
pub const DELIMITERS: [char; 4] = ['.', '!', '?', '\n'];

/// Turns an incrementally generated token stream into whole sentences.
///
/// The buffer belongs to exactly one streamed response. Sentences keep their
/// delimiter and are trimmed; whitespace-only pieces are dropped.
#[derive(Debug, Default)]
pub struct SentenceSegmenter {
    buffer: String,
}

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment, get back every sentence it completed.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buffer.push_str(fragment);
        let mut sentences = Vec::new();

        while let Some(pos) = self.buffer.find(DELIMITERS) {
            // Delimiters are all single-byte.
            let rest = self.buffer.split_off(pos + 1);
            let sentence = std::mem::replace(&mut self.buffer, rest);
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
        }
        sentences
    }

    /// End of stream: whatever is left is the final sentence.
    pub fn finish(self) -> Option<String> {
        let rest = self.buffer.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }

    /// Segment a finished or lazily produced fragment sequence.
    pub fn segment<I, S>(fragments: I) -> Sentences<I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Sentences {
            source: fragments.into_iter(),
            segmenter: Some(SentenceSegmenter::new()),
            ready: std::collections::VecDeque::new(),
        }
    }
}

/// Lazy sentence iterator over a fragment iterator.
pub struct Sentences<I> {
    source: I,
    segmenter: Option<SentenceSegmenter>,
    ready: std::collections::VecDeque<String>,
}

impl<I, S> Iterator for Sentences<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(sentence) = self.ready.pop_front() {
                return Some(sentence);
            }
            let segmenter = self.segmenter.as_mut()?;
            match self.source.next() {
                Some(fragment) => self.ready.extend(segmenter.push(fragment.as_ref())),
                None => return self.segmenter.take().and_then(SentenceSegmenter::finish),
            }
        }
    }
}
