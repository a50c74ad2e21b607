#![forbid(unsafe_code)]

//! Sigtuna CLI — SAML 2.0 assertion operations (inspect, verify, sign, decrypt).

use clap::{Parser, Subcommand};
use sigtuna_assertion::Assertion;
use sigtuna_core::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "sigtuna",
    about = "Sigtuna — Pure Rust SAML 2.0 assertions (XML-DSig, XML-Enc)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug-level tracing)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an assertion and print its contents
    Inspect {
        /// Input assertion XML file
        file: PathBuf,
    },

    /// Verify a signed assertion against a certificate or public key
    Verify {
        /// Input assertion XML file
        file: PathBuf,

        /// X.509 certificate or SPKI public key (PEM)
        #[arg(short, long)]
        cert: PathBuf,
    },

    /// Sign an assertion with a private key
    Sign {
        /// Input assertion XML file
        file: PathBuf,

        /// Private key (PEM, PKCS#8 or PKCS#1)
        #[arg(short, long)]
        key: PathBuf,

        /// Certificate (PEM) to embed in the signature KeyInfo
        #[arg(short, long)]
        cert: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt the encrypted attributes of an assertion
    Decrypt {
        /// Input assertion XML file
        file: PathBuf,

        /// Private key (PEM, PKCS#8 or PKCS#1)
        #[arg(short, long)]
        key: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Inspect { file } => cmd_inspect(file),
        Commands::Verify { file, cert } => cmd_verify(file, cert),
        Commands::Sign {
            file,
            key,
            cert,
            output,
        } => cmd_sign(file, key, cert, output),
        Commands::Decrypt { file, key, output } => cmd_decrypt(file, key, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn cmd_inspect(file: PathBuf) -> Result<(), Error> {
    let assertion = Assertion::from_xml(&read_file(&file)?)?;

    println!("ID:            {}", assertion.id());
    println!("Issuer:        {}", assertion.issuer());
    println!("IssueInstant:  {}", assertion.issue_instant().to_rfc3339());
    if let Some(name_id) = assertion.name_id() {
        println!("NameID:        {}", name_id.value);
    }
    if !assertion.valid_audiences().is_empty() {
        println!("Audiences:     {}", assertion.valid_audiences().join(", "));
    }
    if let Some(class_ref) = assertion.authn_context_class_ref() {
        println!("AuthnContext:  {class_ref}");
    }
    if let Some(decl_ref) = assertion.authn_context_decl_ref() {
        println!("AuthnDeclRef:  {decl_ref}");
    }
    for attribute in assertion.attributes() {
        println!(
            "Attribute:     {} ({} value{})",
            attribute.name,
            attribute.values.len(),
            if attribute.values.len() == 1 { "" } else { "s" }
        );
    }
    println!(
        "Signed:        {}",
        match assertion.signature_method() {
            Some(method) => method.to_owned(),
            None => "no".to_owned(),
        }
    );
    println!(
        "Encrypted attributes: {}",
        if assertion.has_encrypted_attributes() { "yes" } else { "no" }
    );
    Ok(())
}

fn cmd_verify(file: PathBuf, cert: PathBuf) -> Result<(), Error> {
    let assertion = Assertion::from_xml(&read_file(&file)?)?;
    let key = sigtuna_keys::loader::load_public_key_pem(&read_file(&cert)?)?;

    if assertion.validate(&key)? {
        println!("OK");
        Ok(())
    } else {
        eprintln!("UNSIGNED: assertion carries no signature");
        process::exit(1);
    }
}

fn cmd_sign(
    file: PathBuf,
    key: PathBuf,
    cert: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let mut assertion = Assertion::from_xml(&read_file(&file)?)?;
    let signing_key = sigtuna_keys::loader::load_private_key_pem(&read_file(&key)?)?;

    if let Some(cert_path) = cert {
        let body = sigtuna_keys::loader::certificate_body(&read_file(&cert_path)?);
        assertion.set_certificates(vec![body]);
    }
    assertion.set_signing_key(signing_key);

    write_output(output, assertion.to_xml()?.as_bytes())
}

fn cmd_decrypt(file: PathBuf, key: PathBuf, output: Option<PathBuf>) -> Result<(), Error> {
    let mut assertion = Assertion::from_xml(&read_file(&file)?)?;
    if !assertion.has_encrypted_attributes() {
        eprintln!("nothing to decrypt: assertion has no encrypted attributes");
        return Ok(());
    }
    let private_key = sigtuna_keys::loader::load_private_key_pem(&read_file(&key)?)?;
    assertion.decrypt_attributes(&private_key)?;
    assertion.set_encrypted_attributes(false);

    write_output(output, assertion.to_xml()?.as_bytes())
}

// ── Utility functions ────────────────────────────────────────────────

fn read_file(path: &PathBuf) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => {
            std::fs::write(&p, data).map_err(|e| Error::Other(format!("{}: {e}", p.display())))
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(data)
                .map_err(|e| Error::Other(format!("stdout: {e}")))
        }
    }
}
