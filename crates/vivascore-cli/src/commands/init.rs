//! The `vivascore init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("vivascore.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-banks")?;
    write_if_missing(Path::new("question-banks/example.toml"), EXAMPLE_BANK)?;

    std::fs::create_dir_all("answers")?;
    write_if_missing(Path::new("answers/example.toml"), EXAMPLE_ANSWERS)?;

    println!("\nNext steps:");
    println!("  1. Run: vivascore validate --bank question-banks/example.toml --answers answers/example.toml");
    println!("  2. Run: vivascore batch --answers answers/example.toml --format all");
    println!("  3. Tune weights and thresholds under [scoring] in vivascore.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# vivascore configuration

question_bank = "question-banks/example.toml"
parallelism = 4
output_dir = "./vivascore-results"

# Replace the built-in word tables with your own.
# lexicon_path = "lexicon.toml"

[scoring.weights]
technical = 0.4
clarity = 0.3
confidence = 0.3

[scoring.suggestions]
score_threshold = 6.0
max_suggestions = 5

[audio]
# none | file | http
type = "none"
timeout_ms = 5000
# url = "${VIVASCORE_AUDIO_URL}"
# api_key = "${VIVASCORE_AUDIO_KEY}"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Question Bank"
description = "A couple of questions to get started"

[[questions]]
id = 1
question = "How does a hash map work internally?"
category = "Data Structures"
difficulty = "medium"
must_have_concepts = ["hash function", "bucket", "collision"]
good_to_have_concepts = ["load factor", "chaining"]
red_flags = ["always constant time"]
ideal_answer = """
A hash map is a data structure that stores key value pairs. It works by applying a
hash function to the key to pick a bucket in an array. Collisions are resolved by
chaining or open addressing, and the table resizes when the load factor grows. For
example, a phone book maps names to numbers. In summary, lookups are constant time
on average.
"""

[[questions]]
id = 2
question = "What is the difference between a process and a thread?"
category = "Operating Systems"
difficulty = "easy"
must_have_concepts = ["memory", "scheduling"]
good_to_have_concepts = ["context switch"]
"#;

const EXAMPLE_ANSWERS: &str = r#"[session]
id = "example-session"
candidate = "Example Candidate"

[[answers]]
id = "a1"
question_id = 1
transcript = """
A hash map is a data structure for key value lookups. It works by running a hash
function over the key to choose a bucket. When two keys collide we handle the
collision with chaining. For example, a phone book. In summary, lookups are fast.
"""

[answers.audio]
speaking_rate = 140.0
long_pauses = 1

[[answers]]
id = "a2"
question_id = 2
transcript = "Um, so, like, a process is uh bigger I guess. Threads are, um, smaller."
"#;
