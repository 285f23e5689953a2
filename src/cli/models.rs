use nomic_client::chat::ChatModel;
use nomic_client::embedding::{ModelRegistry, TextEmbeddingModel};

/// Print the known embedding and chat models.
pub fn models() {
    let registry = ModelRegistry::default();

    println!("Embedding models");
    println!("{}", "=".repeat(40));
    for model in TextEmbeddingModel::ALL {
        let Ok(info) = registry.get(model) else {
            println!("  {model:<28} (no model info)");
            continue;
        };
        let dims: Vec<String> = info.recommended_dims().iter().map(|d| d.to_string()).collect();
        println!("  {model}");
        println!("    dim:               {}", info.dim);
        println!("    max length:        {}", info.max_length);
        println!("    pad id:            {}", info.pad_id);
        println!("    recommended dims:  {}", dims.join(", "));
        println!("    matryoshka:        {}", model.matryoshka_capable());
        println!("    hamming:           {}", model.hamming_capable());
    }
    println!();

    println!("Chat models");
    println!("{}", "=".repeat(40));
    for model in ChatModel::ALL {
        println!("  {model}");
    }
}
