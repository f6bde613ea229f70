//! Adaptive question generation.
//!
//! Keys for progression drills are drawn with weight `max(1, 11 - proficiency)`,
//! so weak keys come back more often while mastered ones still appear. Other
//! question kinds draw keys uniformly; skill level only decides which kinds
//! are eligible.

use rand::Rng;
use rand::seq::index;

use fifths_core::model::{ExerciseType, ProficiencyMap};
use fifths_core::scoring::resolve_key;
use fifths_core::theory::{
    CIRCLE, Chord, ChordQuality, DEGREE_COUNT, Direction, Key, KeySignature, ROMAN_NUMERALS,
    chord_set, degree_of, key_with_signature, relative_minor, signature_count, steps_around, triad,
};

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Every shape of question the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// How many sharps/flats does key X carry?
    SignatureCount,
    /// Which key carries N sharps/flats?
    KeyForSignature,
    /// Which key is N steps around the circle from X?
    CircularPosition,
    /// Relative minor of a major key.
    RelativeMinor,
    /// Relative major of a minor key.
    RelativeMajor,
    /// Chord on scale degree N of key X.
    ChordAtDegree,
    /// Scale degree of chord Y in key X.
    DegreeOfChord,
    /// Notes of the triad on degree N of key X.
    TriadSpelling,
    /// One blank of a diatonic progression.
    ProgressionSlot,
}

/// Kinds unlocked one by one for key identification as skill grows.
pub const IDENTIFICATION_KINDS: [QuestionKind; 4] = [
    QuestionKind::SignatureCount,
    QuestionKind::CircularPosition,
    QuestionKind::RelativeMinor,
    QuestionKind::ChordAtDegree,
];

const RELATIVE_KINDS: [QuestionKind; 2] = [QuestionKind::RelativeMinor, QuestionKind::RelativeMajor];

const SIGNATURE_KINDS: [QuestionKind; 2] =
    [QuestionKind::SignatureCount, QuestionKind::KeyForSignature];

const ADVANCED_KINDS: [QuestionKind; 3] = [
    QuestionKind::ChordAtDegree,
    QuestionKind::DegreeOfChord,
    QuestionKind::TriadSpelling,
];

/// A single quiz item.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
    pub expected: String,
    /// Other spellings accepted as correct.
    pub alternatives: Vec<String>,
    /// Key the question is about.
    pub subject: Key,
    /// Key whose proficiency a correct answer raises.
    pub credited_key: Key,
}

impl Question {
    fn new(kind: QuestionKind, subject: Key, prompt: String, expected: String) -> Self {
        // Credit follows the key named in the answer when there is one.
        let credited_key = resolve_key(&expected).unwrap_or(subject);
        Self {
            kind,
            prompt,
            expected,
            alternatives: Vec::new(),
            subject,
            credited_key,
        }
    }

    fn accepting(mut self, alternatives: impl IntoIterator<Item = String>) -> Self {
        let expected = self.expected.clone();
        self.alternatives
            .extend(alternatives.into_iter().filter(|alt| *alt != expected));
        self
    }
}

//
// ─── RANDOM HELPERS ────────────────────────────────────────────────────────────
//

fn pick<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> T {
    items[rng.random_range(0..items.len())]
}

fn any_key<R: Rng + ?Sized>(rng: &mut R) -> Key {
    pick(&CIRCLE, rng)
}

/// Draw a key with probability proportional to `max(1, 11 - proficiency)`.
pub fn weighted_key<R: Rng + ?Sized>(proficiency: &ProficiencyMap, rng: &mut R) -> Key {
    let total: f64 = CIRCLE
        .iter()
        .map(|key| proficiency.selection_weight(*key))
        .sum();
    let mut draw = rng.random_range(0.0..total);
    for key in CIRCLE {
        let weight = proficiency.selection_weight(key);
        if draw < weight {
            return key;
        }
        draw -= weight;
    }
    // Floating-point leftovers land on the last key.
    CIRCLE[CIRCLE.len() - 1]
}

/// Number of identification kinds unlocked at `skill_level`: `min(floor(skill), 3) + 1`.
#[must_use]
pub fn identification_ways(skill_level: f64) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let floor = skill_level.max(0.0).floor() as usize;
    floor.min(3) + 1
}

/// Pick the question kind for the next item of an exercise.
pub fn kind_for<R: Rng + ?Sized>(exercise: ExerciseType, skill_level: f64, rng: &mut R) -> QuestionKind {
    match exercise {
        ExerciseType::KeyIdentification => {
            let ways = identification_ways(skill_level);
            pick(&IDENTIFICATION_KINDS[..ways], rng)
        }
        ExerciseType::RelativeKeys => pick(&RELATIVE_KINDS, rng),
        ExerciseType::KeySignatures => pick(&SIGNATURE_KINDS, rng),
        ExerciseType::Advanced => pick(&ADVANCED_KINDS, rng),
        ExerciseType::ChordProgression => QuestionKind::ProgressionSlot,
    }
}

//
// ─── GENERATION ────────────────────────────────────────────────────────────────
//

fn key_spellings(key: Key) -> impl Iterator<Item = String> {
    key.spellings().iter().map(|s| (*s).to_owned())
}

fn minor_spellings(tonic: Key) -> impl Iterator<Item = String> {
    tonic.spellings().iter().map(|s| format!("{s}m"))
}

/// Spellings on the same side as `signature`: six sharps takes `F#`, not `Gb`.
fn spellings_matching(key: Key, signature: KeySignature) -> impl Iterator<Item = String> {
    key.spellings()
        .iter()
        .filter(move |spelling| {
            let flat = spelling.len() > 1 && spelling.ends_with('b');
            let sharp = spelling.contains('#');
            match (signature.sharps, signature.flats) {
                (0, 0) => !flat && !sharp,
                (_, 0) => !flat,
                _ => !sharp,
            }
        })
        .map(|spelling| (*spelling).to_owned())
}

/// Every in-range signature that names `key`; both sides for `F#/Gb`.
fn signature_phrasings(key: Key) -> Vec<String> {
    let count = signature_count(key).count();
    let mut phrasings: Vec<String> = [KeySignature::sharps(count), KeySignature::flats(count)]
        .into_iter()
        .filter(|signature| key_with_signature(*signature).is_ok_and(|found| found == key))
        .map(KeySignature::describe)
        .collect();
    phrasings.dedup();
    phrasings
}

/// Other ways of writing a chord symbol: `B°` and `Bo` for `Bdim`.
fn chord_spellings(chord: Chord) -> Vec<String> {
    match chord.quality() {
        ChordQuality::Diminished => vec![format!("{}°", chord.root()), format!("{}o", chord.root())],
        ChordQuality::Major | ChordQuality::Minor => Vec::new(),
    }
}

fn signature_count_question(key: Key) -> Question {
    Question::new(
        QuestionKind::SignatureCount,
        key,
        format!(
            "How many sharps or flats are in the key signature of {} major?",
            key.label()
        ),
        signature_count(key).count().to_string(),
    )
    .accepting(signature_phrasings(key))
}

fn key_for_signature_question(key: Key) -> Question {
    let signature = signature_count(key);
    Question::new(
        QuestionKind::KeyForSignature,
        key,
        format!("Which major key has {}?", signature.describe()),
        key.name().to_owned(),
    )
    .accepting(spellings_matching(key, signature))
}

fn chord_at_degree_question(key: Key, degree: usize) -> Question {
    let chord = diatonic(key, degree);
    Question::new(
        QuestionKind::ChordAtDegree,
        key,
        format!(
            "What is the {} chord in {} major?",
            ROMAN_NUMERALS[degree],
            key.name()
        ),
        chord.symbol(),
    )
    .accepting(chord_spellings(chord))
}

fn numeral_without_circle(degree: usize) -> String {
    ROMAN_NUMERALS[degree].trim_end_matches('°').to_owned()
}

/// Produce one question of `kind`.
///
/// `ProgressionSlot` builds a fresh drill and returns its first blank; sessions
/// that need every blank use [`generate_progression`] directly.
pub fn generate<R: Rng + ?Sized>(
    kind: QuestionKind,
    proficiency: &ProficiencyMap,
    skill_level: f64,
    rng: &mut R,
) -> Question {
    match kind {
        QuestionKind::SignatureCount => signature_count_question(any_key(rng)),
        QuestionKind::KeyForSignature => key_for_signature_question(any_key(rng)),
        QuestionKind::CircularPosition => {
            let start = any_key(rng);
            let steps = rng.random_range(1..=6);
            let direction = if rng.random_bool(0.5) {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            };
            let target = steps_around(start, steps, direction);
            let plural = if steps == 1 { "" } else { "s" };
            Question::new(
                kind,
                start,
                format!(
                    "Which key is {steps} step{plural} {} from {} on the circle of fifths?",
                    direction.label(),
                    start.label()
                ),
                target.name().to_owned(),
            )
            .accepting(key_spellings(target))
        }
        QuestionKind::RelativeMinor => {
            let major = any_key(rng);
            let minor = relative_minor(major);
            Question::new(
                kind,
                major,
                format!("What is the relative minor of {} major?", major.label()),
                minor.label(),
            )
            .accepting(minor_spellings(minor.tonic()))
        }
        QuestionKind::RelativeMajor => {
            let major = any_key(rng);
            let minor = relative_minor(major);
            Question::new(
                kind,
                minor.tonic(),
                format!("What is the relative major of {}?", minor.label()),
                major.name().to_owned(),
            )
            .accepting(key_spellings(major))
        }
        QuestionKind::ChordAtDegree => {
            let key = any_key(rng);
            chord_at_degree_question(key, rng.random_range(0..DEGREE_COUNT))
        }
        QuestionKind::DegreeOfChord => {
            let key = any_key(rng);
            let chord = pick(&chord_set(key), rng);
            // Diatonic roots are distinct, so the lookup always lands.
            let degree = degree_of(key, &chord.symbol()).unwrap_or_default();
            Question::new(
                kind,
                key,
                format!(
                    "Which scale degree (1-7) is {chord} in {} major?",
                    key.name()
                ),
                (degree + 1).to_string(),
            )
            .accepting([numeral_without_circle(degree), ROMAN_NUMERALS[degree].to_owned()])
        }
        QuestionKind::TriadSpelling => {
            let key = any_key(rng);
            let degree = rng.random_range(0..DEGREE_COUNT);
            let tones = triad(key, degree).unwrap_or_default();
            Question::new(
                kind,
                key,
                format!(
                    "Spell the {} chord ({}) in {} major, comma-separated (e.g. C,E,G).",
                    ROMAN_NUMERALS[degree],
                    diatonic(key, degree),
                    key.name()
                ),
                tones.join(","),
            )
        }
        QuestionKind::ProgressionSlot => generate_progression(proficiency, skill_level, rng)
            .questions()
            .into_iter()
            .next()
            .unwrap_or_else(|| generate(QuestionKind::ChordAtDegree, proficiency, skill_level, rng)),
    }
}

fn diatonic(key: Key, degree: usize) -> Chord {
    chord_set(key)[degree % DEGREE_COUNT]
}

//
// ─── PROGRESSIONS ──────────────────────────────────────────────────────────────
//

/// Difficulty tier of a progression pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionTier {
    Easy,
    Medium,
    Hard,
}

/// Skill below this draws easy patterns.
pub const MEDIUM_SKILL_THRESHOLD: f64 = 3.0;
/// Skill at or above this draws hard patterns.
pub const HARD_SKILL_THRESHOLD: f64 = 7.0;

const EASY_PATTERNS: &[&[usize]] = &[&[0, 3, 4], &[0, 4, 0], &[0, 5, 4], &[0, 3, 0], &[0, 1, 4]];

const MEDIUM_PATTERNS: &[&[usize]] = &[
    &[0, 4, 5, 3],
    &[0, 5, 3, 4],
    &[1, 4, 0, 0],
    &[0, 3, 4, 0],
    &[0, 5, 1, 4, 0],
    &[0, 3, 1, 4, 0],
];

const HARD_PATTERNS: &[&[usize]] = &[
    &[0, 5, 1, 4, 0],
    &[5, 1, 4, 0, 3],
    &[0, 2, 5, 1, 4, 0],
    &[0, 3, 6, 2, 5, 1, 4],
    &[0, 4, 5, 2, 3, 0, 4],
];

impl ProgressionTier {
    #[must_use]
    pub fn for_skill(skill_level: f64) -> Self {
        if skill_level < MEDIUM_SKILL_THRESHOLD {
            ProgressionTier::Easy
        } else if skill_level < HARD_SKILL_THRESHOLD {
            ProgressionTier::Medium
        } else {
            ProgressionTier::Hard
        }
    }

    /// 1 (easy) to 3 (hard), as stored in history.
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            ProgressionTier::Easy => 1,
            ProgressionTier::Medium => 2,
            ProgressionTier::Hard => 3,
        }
    }

    #[must_use]
    pub fn patterns(self) -> &'static [&'static [usize]] {
        match self {
            ProgressionTier::Easy => EASY_PATTERNS,
            ProgressionTier::Medium => MEDIUM_PATTERNS,
            ProgressionTier::Hard => HARD_PATTERNS,
        }
    }
}

/// Number of blanks for a progression of `len` chords:
/// `min(len - 1, max(1, len / 2))`.
#[must_use]
pub fn hidden_slot_count(len: usize) -> usize {
    (len / 2).max(1).min(len.saturating_sub(1))
}

/// A progression with some chords hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionDrill {
    key: Key,
    tier: ProgressionTier,
    degrees: Vec<usize>,
    chords: Vec<Chord>,
    hidden: Vec<usize>,
}

impl ProgressionDrill {
    #[must_use]
    pub fn key(&self) -> Key {
        self.key
    }

    #[must_use]
    pub fn tier(&self) -> ProgressionTier {
        self.tier
    }

    #[must_use]
    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    #[must_use]
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    /// Hidden positions, ascending.
    #[must_use]
    pub fn hidden(&self) -> &[usize] {
        &self.hidden
    }

    fn numerals_line(&self) -> String {
        self.degrees
            .iter()
            .map(|d| ROMAN_NUMERALS[*d])
            .collect::<Vec<_>>()
            .join(" - ")
    }

    fn chords_line(&self, asking: usize) -> String {
        self.chords
            .iter()
            .enumerate()
            .map(|(pos, chord)| {
                if pos == asking {
                    "[?]".to_owned()
                } else if self.hidden.contains(&pos) {
                    "___".to_owned()
                } else {
                    chord.symbol()
                }
            })
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// One question per hidden position, in progression order.
    #[must_use]
    pub fn questions(&self) -> Vec<Question> {
        self.hidden
            .iter()
            .map(|&pos| Question {
                kind: QuestionKind::ProgressionSlot,
                prompt: format!(
                    "Progression in {} major: {}\n  {}\nWhich chord goes in the [?] slot?",
                    self.key.name(),
                    self.numerals_line(),
                    self.chords_line(pos)
                ),
                expected: self.chords[pos].symbol(),
                alternatives: chord_spellings(self.chords[pos]),
                subject: self.key,
                credited_key: self.key,
            })
            .collect()
    }
}

/// Build a progression drill: key weighted toward weak proficiency, pattern
/// from the tier matching `skill_level`, blanks drawn without replacement.
pub fn generate_progression<R: Rng + ?Sized>(
    proficiency: &ProficiencyMap,
    skill_level: f64,
    rng: &mut R,
) -> ProgressionDrill {
    let key = weighted_key(proficiency, rng);
    let tier = ProgressionTier::for_skill(skill_level);
    let degrees = pick(tier.patterns(), rng).to_vec();
    let chords: Vec<Chord> = degrees.iter().map(|d| diatonic(key, *d)).collect();

    let mut hidden = index::sample(rng, degrees.len(), hidden_slot_count(degrees.len())).into_vec();
    hidden.sort_unstable();

    ProgressionDrill {
        key,
        tier,
        degrees,
        chords,
        hidden,
    }
}
