use clap::{Subcommand, ValueEnum};

pub mod ingest;

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a text file, or every .txt/.md file under a directory
    Ingest {
        path: String,

        /// MIME type to record instead of the one guessed from the extension
        #[arg(long)]
        file_type: Option<String>,
    },

    /// Ask a question answered from your documents
    Ask {
        query: String,

        /// Only retrieve from this document
        #[arg(long)]
        document: Option<String>,
    },

    /// Chat with the model without consulting your documents
    Chat {
        message: String,

        /// Replace the default system prompt
        #[arg(long)]
        system: Option<String>,
    },

    Search {
        query: String,

        #[arg(long, default_value = "5")]
        num: usize,

        /// Only keep chunks that literally contain the query
        #[arg(long)]
        hybrid: bool,

        #[arg(short, long)]
        min_score: Option<f32>,

        /// Upper bound of a similarity range; needs --min-score
        #[arg(long, requires = "min_score")]
        max_score: Option<f32>,
    },

    List,

    /// Show the chunks of a document
    Chunks {
        document_id: String,
    },

    Delete {
        document_id: String,
    },

    /// Recompute embeddings for a document
    Reembed {
        document_id: String,
    },

    /// Drop a document's embeddings but keep its chunks
    Forget {
        document_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatProviderArg {
    Openai,
    Anthropic,
}

impl From<ChatProviderArg> for docchat::ChatProvider {
    fn from(arg: ChatProviderArg) -> Self {
        match arg {
            ChatProviderArg::Openai => docchat::ChatProvider::OpenAi,
            ChatProviderArg::Anthropic => docchat::ChatProvider::Anthropic,
        }
    }
}
