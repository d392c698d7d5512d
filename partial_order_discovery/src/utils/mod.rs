/// Odometer style enumeration of digit combinations
pub mod mixed_radix_counter;
/// Key to value-set mapping
pub mod multimap;
/// Trie over label sequences
pub mod prefix_tree;
