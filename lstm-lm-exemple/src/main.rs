use lstm_lm_core::{GenerationRequest, InferenceContext, ModelConfig, VocabularyTable, transliterate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Build a small vocabulary; "<unk>" is mandatory and catches every unknown word
    let vocab = VocabularyTable::from_tokens([
        "<unk>", "हाम्रो", "देश", "नेपाल", "हो", "सुन्दर", "छ", "म", "घर", "जान्छु", "आज", "।",
    ])?;

    // Untrained weights with the same architecture as the trained artifact.
    // A real deployment uses `InferenceContext::load("./model", config)` instead
    let config = ModelConfig::default();
    let context = InferenceContext::cold_start(vocab, config, 42)?;

    // Write the artifacts so that the server can load them from ./model
    context.save("./model")?;
    println!("Artifacts written to ./model");

    // Words missing from the vocabulary are mapped to "<unk>", they never fail
    let generator = context.generator();
    let request = GenerationRequest::new("हाम्रो देश Kathmandu", 8, 1.0, 7)?;
    println!("Generated: {}", generator.generate(&request)?);

    // Same prompt, length, temperature and seed: same output
    let again = generator.generate(&request)?;
    println!("Replayed:  {}", again);

    // Lower temperature sharpens the distribution, higher flattens it
    for temperature in [0.05, 0.5, 1.0, 2.0] {
        println!("temperature {:>4}: {}", temperature, context.generate("नेपाल", 10, temperature, 1)?);
    }

    // An empty prompt starts from the zero state
    println!("Empty prompt: {}", context.generate("", 5, 1.0, 3)?);

    // Invalid values are rejected before any generation happens
    match context.generate("नेपाल", 5, 0.0, 1) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Temperature 0.0 is invalid: {e}"),
    }
    match context.generate("नेपाल", -1, 1.0, 1) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("max_new_tokens -1 is invalid: {e}"),
    }

    // Dictionary transliteration, case-insensitive
    println!("{}", transliterate("Hamra Nepal Ho"));
    println!("{}", transliterate("namaste sathi, k cha?"));

    Ok(())
}
