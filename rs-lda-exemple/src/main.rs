use rs_lda_core::{run_chains, run_gibbs_sampling, Corpus, Estimates, LdaConfig, LdaError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug prints one line per sweep
    env_logger::init();

    // The sampler expects documents that are already tokenized
    let documents: Vec<Vec<String>> = [
        "cheese milk butter cream cheese yogurt",
        "paris lyon marseille lille paris nice",
        "milk cream butter cheese butter",
        "lyon nice paris bordeaux marseille",
        "cheese paris milk lyon",
    ]
    .iter()
    .map(|line| line.split_whitespace().map(str::to_owned).collect())
    .collect();

    let corpus = Corpus::new(documents);

    // Two topics, vocabulary size taken from the corpus itself
    let config = LdaConfig::new(2, corpus.distinct_terms())
        .alpha(0.5)
        .beta(0.1)
        .iterations(200)
        .seed(42);

    let estimates = run_gibbs_sampling(&corpus, corpus.len(), &config)?;

    // Document-topic mixtures
    for (doc, row) in estimates.theta.iter().enumerate() {
        println!("Document {}: {:?}", doc, row);
    }

    // Five most probable terms per topic
    for topic in 0..estimates.phi.len() {
        println!("Topic {}:", topic);
        for (term, p) in estimates.top_terms(topic, 5) {
            println!("  {}: {:.4}", term, p);
        }
    }

    // A term never seen under a topic still has a baseline probability
    println!("p(\"tokyo\" | topic 0) = {:.6}", estimates.phi.probability(0, "tokyo"));

    // Declaring the wrong number of documents is rejected before sampling
    match run_gibbs_sampling(&corpus, corpus.len() + 1, &config) {
        Ok(_) => println!("Should not happen"),
        Err(LdaError::Configuration(e)) => println!("Rejected: {}", e),
        Err(e) => return Err(e.into()),
    }

    // Independent chains with their own seeds, useful to compare runs
    let chains = run_chains(&corpus, corpus.len(), &config, &[1, 2, 3, 4])?;
    for chain in &chains {
        println!("Chain seed {}: top term of topic 0 is {:?}", chain.seed, chain.top_terms(0, 1));
    }

    // Estimates can be stored and reloaded
    let path = std::env::temp_dir().join("rs-lda-exemple.bin");
    estimates.save(&path)?;
    let reloaded = Estimates::load(&path)?;
    println!("Reloaded estimates match: {}", reloaded == estimates);

    Ok(())
}
