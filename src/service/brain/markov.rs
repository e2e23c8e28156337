//! A word-level Markov chain brain.

use std::collections::HashMap;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::base::types::Res;

use super::GenericBrain;

/// Follower recorded after the last window of a message.
const END: &str = "";

fn fresh_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Markov chain keyed by `order` consecutive words.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkovBrain {
    order: usize,
    max_words: usize,
    chain: HashMap<String, Vec<String>>,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl MarkovBrain {
    pub fn new(order: usize, max_words: usize) -> Self {
        Self::with_rng(order, max_words, fresh_rng())
    }

    pub fn with_rng(order: usize, max_words: usize, rng: StdRng) -> Self {
        Self {
            order: order.max(1),
            max_words,
            chain: HashMap::new(),
            rng,
        }
    }

    pub fn from_json(json: &str) -> Res<Self> {
        let mut brain: Self = serde_json::from_str(json)?;
        brain.order = brain.order.max(1);

        Ok(brain)
    }

    /// Number of distinct windows learned so far.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    fn learn(&mut self, words: &[&str]) {
        if words.len() < self.order {
            return;
        }

        for (i, window) in words.windows(self.order).enumerate() {
            let follower = words.get(i + self.order).copied().unwrap_or(END);
            self.chain.entry(window.join(" ")).or_default().push(follower.to_string());
        }
    }

    fn generate(&mut self, words: &[&str]) -> Option<String> {
        if words.len() < self.order {
            return None;
        }

        let seeds: Vec<&[&str]> = words.windows(self.order).filter(|w| self.chain.contains_key(&w.join(" "))).collect();
        let seed = seeds.choose(&mut self.rng)?;

        let mut output: Vec<String> = seed.iter().map(|w| w.to_string()).collect();

        while output.len() < self.max_words {
            let key = output[output.len() - self.order..].join(" ");
            let Some(next) = self.chain.get(&key).and_then(|followers| followers.choose(&mut self.rng)) else {
                break;
            };

            if next == END {
                break;
            }

            output.push(next.clone());
        }

        Some(output.join(" "))
    }
}

impl GenericBrain for MarkovBrain {
    fn learn_and_reply(&mut self, input: &str) -> Option<String> {
        let words: Vec<&str> = input.split_whitespace().collect();

        self.learn(&words);
        self.generate(&words)
    }

    fn to_json(&self) -> Res<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brain(order: usize) -> MarkovBrain {
        MarkovBrain::with_rng(order, 30, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_reply_follows_learned_chain() {
        let mut brain = brain(1);

        let reply = brain.learn_and_reply("the cat sat").unwrap();

        assert!("the cat sat".ends_with(&reply), "unexpected reply: {reply}");
        assert_eq!(brain.len(), 3);
    }

    #[test]
    fn test_short_input_is_ignored() {
        let mut brain = brain(3);

        assert_eq!(brain.learn_and_reply("too short"), None);
        assert!(brain.is_empty());
    }

    #[test]
    fn test_reply_is_capped() {
        let mut brain = MarkovBrain::with_rng(1, 5, StdRng::seed_from_u64(1));

        // "a" follows itself, so only the cap ends most walks.
        brain.learn_and_reply("a a a a a a a a");
        let reply = brain.learn_and_reply("a").unwrap();

        assert!(reply.split_whitespace().count() <= 5);
    }

    #[test]
    fn test_learns_across_messages() {
        let mut brain = brain(2);

        brain.learn_and_reply("gentoo is fun to compile");
        brain.learn_and_reply("sabayon is fun to use");

        let reply = brain.learn_and_reply("is fun").unwrap();
        assert!(reply == "is fun" || reply.starts_with("is fun to "), "unexpected reply: {reply}");
    }

    #[test]
    fn test_restored_brain_keeps_chain() {
        let mut original = brain(1);
        original.learn_and_reply("hello world");

        let restored = MarkovBrain::from_json(&original.to_json().unwrap()).unwrap();

        assert_eq!(restored.len(), original.len());
        assert_eq!(restored.order, 1);
    }

    #[test]
    fn test_loaded_zero_order_is_clamped() {
        let mut brain = MarkovBrain::from_json(r#"{"order": 0, "max_words": 30, "chain": {}}"#).unwrap();

        let reply = brain.learn_and_reply("no panic here").unwrap();

        assert!("no panic here".ends_with(&reply), "unexpected reply: {reply}");
        assert_eq!(brain.len(), 3);
    }
}
