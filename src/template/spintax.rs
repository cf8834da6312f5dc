//! Spintax scanner: `{a|b|{c|d}}` groups, resolved innermost first.
//!
//! The scanner makes one left-to-right pass with a stack of open groups.
//! A group is resolved the moment its closing brace is read, so nested
//! groups always resolve before the group that contains them. Slot
//! positions follow that closing order.
//!
//! `{{key}}` and `{{key|default}}` tokens belong to the variable layer and
//! are copied through untouched.

use rand::rngs::ThreadRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::template::TemplateWarning;

/// One brace group discovered in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpintaxSlot {
    /// Raw group text from the input, braces included.
    pub original: String,
    /// Raw option texts (nested groups left unresolved). Never empty.
    pub options: Vec<String>,
    /// Resolution order of this group.
    pub position: usize,
    /// Byte offset of the opening brace in the input.
    pub start: usize,
    /// Byte offset one past the closing brace.
    pub end: usize,
}

/// Strategy that picks one option per spintax group.
///
/// Returns the index of the chosen option. Indices past the end wrap
/// around the option count.
pub trait Chooser {
    fn choose(&mut self, options: &[&str], slot: usize) -> usize;
}

impl<F> Chooser for F
where
    F: FnMut(&[&str], usize) -> usize,
{
    fn choose(&mut self, options: &[&str], slot: usize) -> usize {
        self(options, slot)
    }
}

/// Uniform random selection from the thread-local generator.
pub struct RandomChooser {
    rng: ThreadRng,
}

impl RandomChooser {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl Chooser for RandomChooser {
    fn choose(&mut self, options: &[&str], _slot: usize) -> usize {
        self.rng.gen_range(0..options.len())
    }
}

/// Uniform random selection that replays identically for the same seed.
pub struct SeededChooser {
    rng: ChaCha8Rng,
}

impl SeededChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Chooser for SeededChooser {
    fn choose(&mut self, options: &[&str], _slot: usize) -> usize {
        self.rng.gen_range(0..options.len())
    }
}

/// Picks option `digits[slot]` for each slot; missing digits pick the first option.
pub struct IndexChooser<'a> {
    digits: &'a [u64],
}

impl<'a> IndexChooser<'a> {
    pub fn new(digits: &'a [u64]) -> Self {
        Self { digits }
    }
}

impl Chooser for IndexChooser<'_> {
    fn choose(&mut self, options: &[&str], slot: usize) -> usize {
        let digit = self.digits.get(slot).copied().unwrap_or(0);
        (digit % options.len() as u64) as usize
    }
}

/// Always picks the first option.
pub struct FirstChooser;

impl Chooser for FirstChooser {
    fn choose(&mut self, _options: &[&str], _slot: usize) -> usize {
        0
    }
}

/// Result of resolving every group in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    /// Chosen option text per slot, in slot order.
    pub choices: Vec<String>,
    pub warnings: Vec<TemplateWarning>,
}

/// Slots of a template without resolving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotScan {
    pub slots: Vec<SpintaxSlot>,
    pub warnings: Vec<TemplateWarning>,
}

impl SlotScan {
    /// Option count per slot, in slot order.
    pub fn sizes(&self) -> Vec<u64> {
        self.slots.iter().map(|s| s.options.len() as u64).collect()
    }

    /// Product of all slot sizes, or `None` on overflow. An empty template has one combination.
    pub fn total_combinations(&self) -> Option<u64> {
        self.slots
            .iter()
            .try_fold(1u64, |acc, s| acc.checked_mul(s.options.len() as u64))
    }

    /// Number of selections that differ once digits of groups inside an
    /// unchosen option are ignored, or `None` on overflow.
    ///
    /// Equals [`total_combinations`](Self::total_combinations) when no group
    /// is nested. `{a|{b|c}}` has 4 addresses but only 3 such selections:
    /// while `a` is chosen, the inner digit changes nothing.
    pub fn distinct_combinations(&self) -> Option<u64> {
        // children[slot][option] = slots nested directly in that option
        let mut children: Vec<Vec<Vec<usize>>> = self
            .slots
            .iter()
            .map(|s| vec![Vec::new(); s.options.len()])
            .collect();
        let mut roots = Vec::new();

        for (i, slot) in self.slots.iter().enumerate() {
            let parent = self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, p)| p.start < slot.start && slot.end <= p.end)
                .min_by_key(|(_, p)| p.end - p.start);
            match parent {
                Some((j, p)) => children[j][p.option_at(slot.start)].push(i),
                None => roots.push(i),
            }
        }

        // Slots close innermost first, so every child is counted before its parent.
        let mut counts = vec![0u64; self.slots.len()];
        for (i, options) in children.iter().enumerate() {
            let mut count = 0u64;
            for nested in options {
                let product = nested
                    .iter()
                    .try_fold(1u64, |acc, &c| acc.checked_mul(counts[c]))?;
                count = count.checked_add(product)?;
            }
            counts[i] = count;
        }

        roots
            .iter()
            .try_fold(1u64, |acc, &r| acc.checked_mul(counts[r]))
    }
}

impl SpintaxSlot {
    /// Index of the option containing input offset `offset`.
    fn option_at(&self, offset: usize) -> usize {
        let mut option_start = self.start + 1;
        for (k, option) in self.options.iter().enumerate() {
            let option_end = option_start + option.len();
            if offset < option_end {
                return k;
            }
            option_start = option_end + 1;
        }
        self.options.len().saturating_sub(1)
    }
}

/// Resolve every spintax group in `text` using `chooser`.
pub fn resolve_spintax(text: &str, chooser: &mut dyn Chooser) -> Resolved {
    let scan = scan(text, chooser, false);
    Resolved {
        text: scan.text,
        choices: scan.choices,
        warnings: scan.warnings,
    }
}

/// Discover the slots of `text` in resolution order.
pub fn parse_slots(text: &str) -> SlotScan {
    let scan = scan(text, &mut FirstChooser, true);
    SlotScan {
        slots: scan.slots,
        warnings: scan.warnings,
    }
}

/// An open group on the scanner stack.
struct Frame {
    /// Offset of `{` in the output buffer.
    out_start: usize,
    /// Offset of `{` in the input.
    in_start: usize,
    out_pipes: Vec<usize>,
    in_pipes: Vec<usize>,
}

struct ScanOutput {
    text: String,
    choices: Vec<String>,
    slots: Vec<SpintaxSlot>,
    warnings: Vec<TemplateWarning>,
}

fn scan(text: &str, chooser: &mut dyn Chooser, record_slots: bool) -> ScanOutput {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<Frame> = Vec::new();
    let mut choices = Vec::new();
    let mut slots = Vec::new();
    let mut warnings = Vec::new();

    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if let Some(end) = variable_token_end(bytes, i) {
                    // Stays part of the pending literal run.
                    i = end;
                    continue;
                }
                out.push_str(&text[literal_start..i]);
                stack.push(Frame {
                    out_start: out.len(),
                    in_start: i,
                    out_pipes: Vec::new(),
                    in_pipes: Vec::new(),
                });
                out.push('{');
            }
            b'|' => {
                out.push_str(&text[literal_start..i]);
                if let Some(frame) = stack.last_mut() {
                    frame.out_pipes.push(out.len());
                    frame.in_pipes.push(i);
                }
                out.push('|');
            }
            b'}' => {
                out.push_str(&text[literal_start..i]);
                match stack.pop() {
                    Some(frame) => {
                        let position = choices.len();
                        let chosen = {
                            let options = split_at_pipes(
                                &out,
                                frame.out_start + 1,
                                out.len(),
                                &frame.out_pipes,
                            );
                            let pick = chooser.choose(&options, position) % options.len();
                            options[pick].to_string()
                        };
                        if record_slots {
                            let raw_options =
                                split_at_pipes(text, frame.in_start + 1, i, &frame.in_pipes);
                            slots.push(SpintaxSlot {
                                original: text[frame.in_start..=i].to_string(),
                                options: raw_options.into_iter().map(String::from).collect(),
                                position,
                                start: frame.in_start,
                                end: i + 1,
                            });
                        }
                        out.truncate(frame.out_start);
                        out.push_str(&chosen);
                        choices.push(chosen);
                    }
                    None => {
                        warnings.push(TemplateWarning::UnmatchedClose { offset: i });
                        out.push('}');
                    }
                }
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 1;
        literal_start = i;
    }
    out.push_str(&text[literal_start..]);

    for frame in &stack {
        warnings.push(TemplateWarning::UnclosedGroup {
            offset: frame.in_start,
        });
    }
    warnings.sort_by_key(TemplateWarning::offset);

    ScanOutput {
        text: out,
        choices,
        slots,
        warnings,
    }
}

/// Split `s[from..to]` at the given absolute pipe offsets.
fn split_at_pipes<'s>(s: &'s str, from: usize, to: usize, pipes: &[usize]) -> Vec<&'s str> {
    let mut options = Vec::with_capacity(pipes.len() + 1);
    let mut prev = from;
    for &pipe in pipes {
        options.push(&s[prev..pipe]);
        prev = pipe + 1;
    }
    options.push(&s[prev..to]);
    options
}

/// If a `{{...}}` variable token starts at `i`, return the offset just past it.
///
/// The token body must be free of braces and its key, the part before the
/// first `|`, must be non-empty: the same shape the variable resolver accepts.
fn variable_token_end(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i + 1) != Some(&b'{') {
        return None;
    }
    let body_start = i + 2;
    let mut key_end = None;
    let mut j = body_start;
    while j < bytes.len() {
        match bytes[j] {
            b'{' => return None,
            b'|' if key_end.is_none() => {
                key_end = Some(j);
                j += 1;
            }
            b'}' => {
                let has_key = key_end.unwrap_or(j) > body_start;
                return (has_key && bytes.get(j + 1) == Some(&b'}')).then_some(j + 2);
            }
            _ => j += 1,
        }
    }
    None
}
