//! Built-in practice words grouped by the sound contrast they exercise

use super::Category::{
    self, Actions, Animals, Body, Colors, Fruit, Nature, Numbers, Objects, Vegetables,
};

/// Compile-time word record, promoted to `WordEntry` when the dictionary loads
pub(super) struct RawEntry {
    pub word: &'static str,
    pub phonemes: &'static [&'static str],
    pub target_sound: &'static str,
    pub difficulty: u8,
    pub category: Category,
}

const fn w(
    word: &'static str,
    phonemes: &'static [&'static str],
    target_sound: &'static str,
    difficulty: u8,
    category: Category,
) -> RawEntry {
    RawEntry {
        word,
        phonemes,
        target_sound,
        difficulty,
        category,
    }
}

pub(super) const WORDS: &[RawEntry] = &[
    // v / w confusion
    w("van", &["v", "ae", "n"], "v", 1, Objects),
    w("vase", &["v", "aa", "z"], "v", 2, Objects),
    w("violin", &["v", "ie", "u", "l", "i", "n"], "v", 3, Objects),
    w("vest", &["v", "eh", "s", "t"], "v", 1, Objects),
    w("vegetable", &["v", "eh", "j", "t", "u", "b", "l"], "v", 3, Vegetables),
    w("volcano", &["v", "o", "l", "k", "ae", "n", "oe"], "v", 3, Nature),
    w("vacuum", &["v", "ae", "k", "y", "oo", "m"], "v", 3, Objects),
    w("village", &["v", "i", "l", "i", "j"], "v", 2, Nature),
    w("voice", &["v", "oy", "s"], "v", 2, Body),
    w("water", &["w", "aw", "t", "er"], "w", 1, Nature),
    w("window", &["w", "i", "n", "d", "oe"], "w", 1, Objects),
    w("whale", &["w", "ae", "l"], "w", 2, Animals),
    w("wolf", &["w", "uu", "l", "f"], "w", 2, Animals),
    w("worm", &["w", "er", "m"], "w", 1, Animals),
    w("watch", &["w", "o", "ch"], "w", 2, Objects),
    w("web", &["w", "eh", "b"], "w", 1, Nature),
    w("wet", &["w", "eh", "t"], "w", 1, Actions),
    w("wagon", &["w", "ae", "g", "u", "n"], "w", 2, Objects),
    // th
    w("three", &["th", "r", "ee"], "th", 2, Numbers),
    w("thirteen", &["th", "er", "t", "ee", "n"], "th", 3, Numbers),
    w("thirty", &["th", "er", "t", "ee"], "th", 3, Numbers),
    w("thumb", &["th", "u", "m"], "th", 2, Body),
    w("teeth", &["t", "ee", "th"], "th", 2, Body),
    w("mouth", &["m", "ow", "th"], "th", 2, Body),
    w("thank", &["th", "ae", "ng", "k"], "th", 1, Actions),
    w("thin", &["th", "i", "n"], "th", 2, Actions),
    w("bath", &["b", "ae", "th"], "th", 1, Objects),
    w("moth", &["m", "aw", "th"], "th", 2, Animals),
    w("earth", &["er", "th"], "th", 2, Nature),
    w("north", &["n", "or", "th"], "th", 2, Nature),
    // s blends
    w("school", &["s", "k", "oo", "l"], "sc", 2, Objects),
    w("star", &["s", "t", "ar"], "st", 1, Nature),
    w("spoon", &["s", "p", "oo", "n"], "sp", 1, Objects),
    w("spider", &["s", "p", "ie", "d", "er"], "sp", 2, Animals),
    w("snake", &["s", "n", "ae", "k"], "sn", 1, Animals),
    w("snail", &["s", "n", "ae", "l"], "sn", 2, Animals),
    w("slide", &["s", "l", "ie", "d"], "sl", 2, Objects),
    w("sleep", &["s", "l", "ee", "p"], "sl", 1, Actions),
    w("sky", &["s", "k", "ie"], "sk", 1, Nature),
    w("skirt", &["s", "k", "er", "t"], "sk", 2, Objects),
    w("smile", &["s", "m", "ie", "l"], "sm", 1, Actions),
    w("smoke", &["s", "m", "oe", "k"], "sm", 2, Nature),
    w("stop", &["s", "t", "o", "p"], "st", 1, Actions),
    w("stone", &["s", "t", "oe", "n"], "st", 2, Nature),
    w("swim", &["s", "w", "i", "m"], "sw", 1, Actions),
    w("sweet", &["s", "w", "ee", "t"], "sw", 2, Fruit),
    // sh vs s
    w("sheep", &["sh", "ee", "p"], "sh", 2, Animals),
    w("ship", &["sh", "i", "p"], "sh", 2, Objects),
    w("shoe", &["sh", "oo"], "sh", 1, Objects),
    w("shirt", &["sh", "er", "t"], "sh", 2, Objects),
    w("shark", &["sh", "ar", "k"], "sh", 2, Animals),
    w("shell", &["sh", "eh", "l"], "sh", 2, Nature),
    w("fish", &["f", "i", "sh"], "sh", 1, Animals),
    w("dish", &["d", "i", "sh"], "sh", 1, Objects),
    w("brush", &["b", "r", "u", "sh"], "sh", 2, Objects),
    w("wash", &["w", "o", "sh"], "sh", 1, Actions),
    // f (often replaced by p)
    w("fan", &["f", "ae", "n"], "f", 1, Objects),
    w("face", &["f", "ae", "s"], "f", 1, Body),
    w("five", &["f", "ie", "v"], "f", 1, Numbers),
    w("four", &["f", "or"], "f", 1, Numbers),
    w("flower", &["f", "l", "ow", "er"], "fl", 2, Nature),
    w("fly", &["f", "l", "ie"], "fl", 1, Actions),
    w("fox", &["f", "o", "k", "s"], "f", 1, Animals),
    w("fruit", &["f", "r", "oo", "t"], "fr", 2, Fruit),
    w("frog", &["f", "r", "o", "g"], "fr", 2, Animals),
    // l vs r
    w("rabbit", &["r", "ae", "b", "i", "t"], "r", 2, Animals),
    w("red", &["r", "eh", "d"], "r", 1, Colors),
    w("run", &["r", "u", "n"], "r", 1, Actions),
    w("rain", &["r", "ae", "n"], "r", 1, Nature),
    w("robot", &["r", "oe", "b", "o", "t"], "r", 2, Objects),
    w("rocket", &["r", "o", "k", "i", "t"], "r", 2, Objects),
    w("lion", &["l", "ie", "u", "n"], "l", 2, Animals),
    w("leaf", &["l", "ee", "f"], "l", 1, Nature),
    w("leg", &["l", "eh", "g"], "l", 1, Body),
    w("lemon", &["l", "eh", "m", "u", "n"], "l", 2, Fruit),
    w("lamp", &["l", "ae", "m", "p"], "l", 1, Objects),
    // consonant clusters
    w("blue", &["b", "l", "ue"], "bl", 2, Colors),
    w("black", &["b", "l", "ae", "k"], "bl", 2, Colors),
    w("block", &["b", "l", "o", "k"], "bl", 2, Objects),
    w("clock", &["k", "l", "o", "k"], "cl", 2, Objects),
    w("clean", &["k", "l", "ee", "n"], "cl", 2, Actions),
    w("cloud", &["k", "l", "ow", "d"], "cl", 2, Nature),
    w("green", &["g", "r", "ee", "n"], "gr", 2, Colors),
    w("grass", &["g", "r", "ae", "s"], "gr", 2, Nature),
    w("grape", &["g", "r", "ae", "p"], "gr", 2, Fruit),
    w("tree", &["t", "r", "ee"], "tr", 2, Nature),
    w("truck", &["t", "r", "u", "k"], "tr", 2, Objects),
    w("train", &["t", "r", "ae", "n"], "tr", 2, Objects),
    // final consonants
    w("cat", &["k", "ae", "t"], "t", 1, Animals),
    w("bat", &["b", "ae", "t"], "t", 1, Animals),
    w("hat", &["h", "ae", "t"], "t", 1, Objects),
    w("dog", &["d", "o", "g"], "g", 1, Animals),
    w("pig", &["p", "i", "g"], "g", 1, Animals),
    w("egg", &["eh", "g"], "g", 1, Fruit),
    w("book", &["b", "uu", "k"], "k", 1, Objects),
    w("duck", &["d", "u", "k"], "k", 1, Animals),
    w("cake", &["k", "ae", "k"], "k", 1, Fruit),
    // fillers
    w("apple", &["ae", "p", "l"], "ae", 1, Fruit),
    w("banana", &["b", "uh", "n", "ae", "n", "uh"], "b", 2, Fruit),
    w("orange", &["o", "r", "i", "n", "j"], "j", 3, Fruit),
    w("ball", &["b", "aw", "l"], "l", 1, Objects),
    w("car", &["k", "ar"], "k", 1, Objects),
    w("sun", &["s", "u", "n"], "s", 1, Nature),
    w("moon", &["m", "oo", "n"], "m", 1, Nature),
    w("nose", &["n", "oe", "z"], "z", 1, Body),
    w("hand", &["h", "ae", "n", "d"], "d", 1, Body),
];
