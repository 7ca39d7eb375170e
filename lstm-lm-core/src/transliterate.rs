use std::collections::HashMap;
use std::sync::LazyLock;

/// Romanized Nepali words and their Devanagari spelling.
const DICTIONARY: &[(&str, &str)] = &[
	("hamro", "हाम्रो"),
	("hamra", "हाम्रा"),
	("nepal", "नेपाल"),
	("ho", "हो"),
	("ek", "एक"),
	("sundar", "सुन्दर"),
	("desh", "देश"),
	("ma", "म"),
	("timro", "तिम्रो"),
	("mero", "मेरो"),
	("k", "के"),
	("ko", "को"),
	("lai", "लाई"),
	("bata", "बाट"),
	("sanga", "सँग"),
	("cha", "छ"),
	("thiyo", "थियो"),
	("garchu", "गर्छु"),
	("gara", "गर"),
	("deu", "देऊ"),
	("linu", "लिनु"),
	("aaja", "आज"),
	("kal", "काल"),
	("bihana", "बिहान"),
	("sanjh", "साँझ"),
	("namaste", "नमस्ते"),
	("dhanyabad", "धन्यवाद"),
	("kasto", "कस्तो"),
	("ramro", "राम्रो"),
	("naya", "नया"),
	("puro", "पुरो"),
	("chhoti", "छोटी"),
	("thulo", "ठूलो"),
	("kalo", "कालो"),
	("seto", "सेतो"),
	("hariyo", "हरियो"),
	("pani", "पानी"),
	("khana", "खाना"),
	("ghar", "घर"),
	("kitab", "किताब"),
	("school", "स्कूल"),
	("bazaar", "बजार"),
	("bhai", "भाई"),
	("bahan", "बहिनी"),
	("ama", "आमा"),
	("baba", "बाबा"),
	("didi", "दिदी"),
	("dai", "दाइ"),
	("keta", "कता"),
	("yaha", "यहाँ"),
	("tyaha", "त्यहाँ"),
	("kaha", "कहाँ"),
	("kahile", "कहिले"),
	("kati", "कति"),
	("sathi", "साथी"),
	("priya", "प्रिय"),
	("khanu", "खानु"),
	("khau", "खाऊ"),
	("piunu", "पिउनु"),
	("piu", "पिऊ"),
	("nau", "नाऊ"),
	("ja", "जा"),
	("aa", "आ"),
	("bas", "बस"),
	("uth", "उठ"),
	("baith", "बैठ"),
	("son", "सुन"),
	("bol", "बोल"),
	("padh", "पढ"),
	("lekh", "लेख"),
	("khel", "खेल"),
];

static MAPPING: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| DICTIONARY.iter().copied().collect());

/// Replaces every known romanized word of `text` with its Devanagari form.
///
/// Words are split on whitespace and matched case-insensitively; unknown
/// words are kept as typed. The result is rejoined with single spaces.
pub fn transliterate(text: &str) -> String {
	text.split_whitespace()
		.map(|word| MAPPING.get(word.to_lowercase().as_str()).copied().unwrap_or(word))
		.collect::<Vec<_>>()
		.join(" ")
}
