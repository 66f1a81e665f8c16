use amp_operator::{
    CustomResourceExt as _,
    apicast::{self, APIcast},
    cli::{self, Command, Opts},
    client::{self, create_client},
    logging::{self, initialize_logging},
};
use clap::Parser;
use snafu::{ResultExt, Snafu};

const LOG_ENV: &str = "AMP_OPERATOR_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitializeLogging { source: logging::Error },

    #[snafu(display("failed to print the CRD"))]
    PrintCrd { source: amp_operator::shared::crd::Error },

    #[snafu(display("failed to create the Kubernetes client"))]
    CreateClient { source: client::Error },

    #[snafu(display("failed to render the template"))]
    Template { source: cli::Error },
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let opts = Opts::parse();

    match opts.command {
        Command::Crd => APIcast::print_yaml_schema().context(PrintCrdSnafu),
        Command::Template(arguments) => arguments.emit().context(TemplateSnafu),
        Command::Run(arguments) => {
            initialize_logging(LOG_ENV, cli::APP_NAME, opts.log_format)
                .context(InitializeLoggingSnafu)?;
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                watch_namespace = %arguments.watch_namespace,
                "starting {}",
                cli::APP_NAME,
            );

            let client = create_client(Some(arguments.field_manager.clone()))
                .await
                .context(CreateClientSnafu)?;
            apicast::controller::run(client, arguments.watch_namespace()).await;
            Ok(())
        }
    }
}
