pub const ALT_TEXT: &str = include_str!("../data/prompts/alt_text.txt");
