use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use keyless::client::{BoundPublicKey, ResponseStatusPolicy};
use keyless::signing::pkcs1v15_scheme;
use keyless::{CertificateBundle, ClientConfig, HandshakeSigner, HashAlgorithm};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HashArg {
    Md5sha1,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl From<HashArg> for HashAlgorithm {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Md5sha1 => HashAlgorithm::Md5Sha1,
            HashArg::Sha1 => HashAlgorithm::Sha1,
            HashArg::Sha224 => HashAlgorithm::Sha224,
            HashArg::Sha256 => HashAlgorithm::Sha256,
            HashArg::Sha384 => HashAlgorithm::Sha384,
            HashArg::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "keyless-client",
    about = "Exercises a keyless signing service with a certificate bundle"
)]
struct Args {
    /// PEM certificate chain, leaf first.
    #[clap(long, env = "KEYLESS_CERTIFICATE", global = true)]
    certificate: Option<PathBuf>,
    #[clap(long, env = "KEYLESS_LOG", default_value = "warn", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the signing service to sign a digest and print the signature as hex.
    Sign {
        #[clap(long, env = "KEYLESS_SIGN_ENDPOINT")]
        sign_endpoint: String,
        #[clap(long, env = "KEYLESS_DECRYPT_ENDPOINT", default_value = "")]
        decrypt_endpoint: String,
        #[clap(long, value_enum, default_value = "sha256")]
        hash: HashArg,
        /// Hex-encoded digest.
        #[clap(long)]
        digest: String,
        /// Treat a non-2xx answer as a failure instead of a signature.
        #[clap(long)]
        enforce_status: bool,
        /// Check the signature against the leaf public key.
        #[clap(long)]
        verify: bool,
        #[clap(long, default_value = "30")]
        timeout_secs: u64,
    },
    /// Print what the certificate bundle would present.
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("keyless={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let certificate = args
        .certificate
        .context("--certificate (or KEYLESS_CERTIFICATE) is required")?;

    match args.command {
        Command::Sign {
            sign_endpoint,
            decrypt_endpoint,
            hash,
            digest,
            enforce_status,
            verify,
            timeout_secs,
        } => {
            let policy = if enforce_status {
                ResponseStatusPolicy::Enforce
            } else {
                ResponseStatusPolicy::Trust
            };
            let config = ClientConfig::new(sign_endpoint, decrypt_endpoint, certificate)
                .with_timeout(Duration::from_secs(timeout_secs))
                .with_status_policy(policy);
            config.validate()?;

            let bundle = CertificateBundle::load_with(&config)
                .with_context(|| format!("loading {}", config.certificate.display()))?;
            let hash = HashAlgorithm::from(hash);
            let digest = hex::decode(digest.trim()).context("--digest must be hex")?;

            let signature = bundle.signer().sign(&digest, Some(hash)).await?;
            println!("{}", hex::encode(&signature));

            if verify {
                let BoundPublicKey::Rsa(public_key) = bundle.signer().public_key() else {
                    bail!("leaf key is not RSA; cannot verify");
                };
                public_key
                    .verify(pkcs1v15_scheme(hash), &digest, &signature)
                    .context("signature does not verify against the leaf public key")?;
                eprintln!("signature verified ({hash})");
            }
        }
        Command::Inspect => {
            let config = ClientConfig::new("", "", certificate);
            let pem = std::fs::read(&config.certificate)
                .with_context(|| format!("reading {}", config.certificate.display()))?;
            let bundle = CertificateBundle::from_pem(&pem, &config)?;
            println!("chain length: {}", bundle.chain().len());
            println!("leaf subject: {}", bundle.leaf().tbs_certificate.subject);
            println!("leaf issuer:  {}", bundle.leaf().tbs_certificate.issuer);
            println!("key kind:     {}", bundle.signer().public_key().kind());
        }
    }

    Ok(())
}
