use clap::Parser;
use elastic_client::{
    create_analyzer, index_properties, ElasticClientError, ElasticSearchClient, SchemaDiff,
    StoreSettings,
};
use elastic_mapping::{load, MappingError, MappingFile};
use schema_ctl::{Command, Opts};
use snafu::{ResultExt, Snafu};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Settings (Configuration or CLI) Error: {}", source))]
    Settings { source: ElasticClientError },

    #[snafu(display("Mapping Error: {}", source))]
    Mapping { source: MappingError },

    #[snafu(display("Elasticsearch Error: {}", source))]
    Elasticsearch { source: ElasticClientError },

    #[snafu(display("{} collection(s) do not match the mapping", count))]
    Inconsistent { count: usize },

    #[snafu(display("Serialization Error: {}", source))]
    Serialization { source: serde_json::Error },

    #[snafu(display("Runtime Error: {}", source))]
    Runtime { source: std::io::Error },
}

fn main() -> Result<(), Error> {
    let opts = Opts::parse();
    let settings = opts.store_settings().context(SettingsSnafu)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match opts.cmd {
        Command::Config => {
            let json = serde_json::to_string_pretty(&settings).context(SerializationSnafu)?;
            println!("{json}");
            Ok(())
        }
        Command::CheckMapping => check_mapping(&settings),
        cmd => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context(RuntimeSnafu)?
            .block_on(run(cmd, settings)),
    }
}

fn read_mapping(settings: &StoreSettings) -> Result<MappingFile, Error> {
    load(settings.mapping_path(), settings.mapping.xsd_validation).context(MappingSnafu)
}

fn check_mapping(settings: &StoreSettings) -> Result<(), Error> {
    let mappings = read_mapping(settings)?;
    println!("{}: {} class(es)", mappings.path().display(), mappings.len());
    for mapping in mappings.iter() {
        println!(
            "  {} -> {} ({} fields)",
            mapping.class_name(),
            mapping.index_name(),
            mapping.fields().len()
        );
    }
    Ok(())
}

async fn run(cmd: Command, settings: StoreSettings) -> Result<(), Error> {
    info!(
        "Trying to connect to elasticsearch at {}:{}",
        settings.elasticsearch.host, settings.elasticsearch.port
    );

    match cmd {
        Command::Tables => {
            let analyzer = create_analyzer(&settings).await.context(ElasticsearchSnafu)?;
            for name in analyzer.tables_names().await.context(ElasticsearchSnafu)? {
                println!("{name}");
            }
        }
        Command::Describe { collection } => {
            let analyzer = create_analyzer(&settings).await.context(ElasticsearchSnafu)?;
            let metadata = analyzer
                .table_info(&collection)
                .await
                .context(ElasticsearchSnafu)?;
            for (key, doc_type) in metadata.iter() {
                println!("{key}\t{doc_type}");
            }
        }
        Command::Verify => {
            let mappings = read_mapping(&settings)?;
            let analyzer = create_analyzer(&settings).await.context(ElasticsearchSnafu)?;

            let mut count: usize = 0;
            for mapping in mappings.iter() {
                let diff = match analyzer.table_info(mapping.index_name()).await {
                    Ok(metadata) => SchemaDiff::between(mapping, &metadata),
                    Err(ElasticClientError::CollectionNotFound(name)) => {
                        println!("'{name}' does not exist");
                        count += 1;
                        continue;
                    }
                    Err(err) => return Err(err).context(ElasticsearchSnafu),
                };
                println!("{diff}");
                if !diff.is_consistent() {
                    count += 1;
                }
            }
            if count > 0 {
                return InconsistentSnafu { count }.fail();
            }
        }
        Command::Init => {
            let mappings = read_mapping(&settings)?;
            let client = ElasticSearchClient::conn(settings.elasticsearch.clone())
                .await
                .context(ElasticsearchSnafu)?;

            for mapping in mappings.iter() {
                let index = mapping.index_name();
                if client.index_exists(index).await.context(ElasticsearchSnafu)? {
                    println!("'{index}' already exists");
                    continue;
                }
                client
                    .create_index(index, index_properties(mapping))
                    .await
                    .context(ElasticsearchSnafu)?;
                println!("created '{index}' for {}", mapping.class_name());
            }
        }
        Command::Config | Command::CheckMapping => {}
    }
    Ok(())
}
