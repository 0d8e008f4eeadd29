use lemma_core::tokenizer::tokenize;
use lemma_core::NormalizationPipeline;

#[test]
fn it_drops_single_chars_and_punctuation() {
    let toks = tokenize("Архив с тестовыми заданиями, за апрель. a b cd");
    assert_eq!(toks, vec!["Архив", "тестовыми", "заданиями", "за", "апрель", "cd"]);
}

#[test]
fn it_keeps_digits_and_underscores_in_words() {
    let toks = tokenize("key_2020: ключи за 20 год, 2019-го");
    assert_eq!(toks, vec!["key_2020", "ключи", "за", "20", "год", "2019", "го"]);
}

#[test]
fn it_preserves_case_and_duplicates() {
    let toks = tokenize("Слона слона СЛОНА");
    assert_eq!(toks, vec!["Слона", "слона", "СЛОНА"]);
    let lemmas = NormalizationPipeline::default().normalize_all(&toks);
    assert_eq!(lemmas, vec!["слон", "слон", "слон"]);
}

#[test]
fn it_normalizes_compatibility_forms() {
    // Fullwidth Latin folds to ASCII before stemming.
    let lemmas = NormalizationPipeline::default().normalize_all(&tokenize("ＲＵＮＮＩＮＧ running"));
    assert_eq!(lemmas, vec!["run", "run"]);
}
