//! Flavor phrases appended to generic action replies.

use rand::Rng;

/// The fixed quip catalog.
pub const QUIPS: &[&str] = &[
    "FOR SCIENCE!",
    "because... reasons.",
    "it's super effective!",
    "because... why not?",
    "was it good for you?",
    "given the alternative, yep, worth it!",
    "don't ask...",
    "then makes a sandwich.",
    "oh noes!",
    "did I do that?",
    "why must you turn this place into a house of lies!",
    "really???",
    "LLLLEEEEEERRRRRROOOOYYYY JEEEENNNKINNNS!",
    "DOH!",
    "Giggity!",
];

/// Picks a quip using the given randomness source.
pub fn select_quip<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    QUIPS[rng.gen_range(0..QUIPS.len())]
}
