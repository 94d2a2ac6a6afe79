use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wifly_driver::config::{LogFormat, LoggingConfig};
use wifly_driver::{
    ConfigLoader, ConnectionState, ConnectionStatus, OptionId, PortError, SyncSerialPort,
    Transport, WiFly,
};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "wifly",
    version,
    about = "Configure and exercise a WiFly module on a serial port.",
    long_about = "Talks to an RN-XV class Wi-Fi module through its serial console: read and write settings, join networks, open connections and drop into a raw terminal."
)]
struct Args {
    /// Serial device or configured alias. Falls back to `serial.port`.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate override.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Configuration file. Defaults to the standard search path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the connection status register.
    Status,
    /// Read one option, e.g. `ip`, `ssid`, `rssi`.
    Get { option: OptionId },
    /// Send a raw `set` command, e.g. `set "set wlan ssid" "My Net"`.
    Set {
        command: String,
        value: Option<String>,
    },
    /// Join a network, or the stored SSID when none is given.
    Join { ssid: Option<String> },
    /// Leave the current network.
    Leave,
    /// Open a TCP connection, optionally send a line and print the reply.
    Open {
        host: String,
        port: u16,
        #[arg(long)]
        send: Option<String>,
        /// How long to collect the reply.
        #[arg(long, default_value_t = 2000)]
        wait_ms: u64,
    },
    /// Resolve a host name on the module.
    Lookup { host: String },
    /// Ping a host from the module.
    Ping { host: String },
    /// Store the current settings in flash.
    Save,
    /// Reboot the module.
    Reboot,
    /// Restore factory defaults.
    FactoryRestore,
    /// Raw console passthrough until the escape character is typed.
    Terminal {
        #[arg(long, default_value_t = '~')]
        escape: char,
    },
}

#[derive(Serialize)]
struct StatusReport {
    port: String,
    prompt: Option<String>,
    connection: ConnectionState,
    status: ConnectionStatus,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(baud) = args.baud {
        loader.config_mut().serial.baud = baud;
    }
    let config = loader.into_config();
    init_logging(&config.logging, args.verbose);

    let port_name = args
        .port
        .as_deref()
        .or(config.serial.port.as_deref())
        .map(|name| config.serial.resolve_port(name))
        .ok_or("no serial port given; use --port or set serial.port")?;

    info!(port = %port_name, baud = config.serial.baud, "opening module");
    let transport = SyncSerialPort::open(&port_name, config.serial.port_configuration())?;
    let mut wifly = WiFly::new(transport, &config);

    match args.command {
        Command::Status => {
            let status = wifly.poll_status()?;
            let report = StatusReport {
                port: port_name,
                prompt: wifly.prompt(),
                connection: wifly.connection_state(),
                status,
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("port:          {}", report.port);
                println!("prompt:        {}", report.prompt.unwrap_or_default());
                println!("register:      0x{:04x}", status.raw);
                println!("tcp:           {:?}", status.tcp);
                println!("associated:    {}", status.associated);
                println!("authenticated: {}", status.authenticated);
                println!("dns found:     {}", status.dns_found);
                println!("channel:       {}", status.channel);
            }
        }
        Command::Get { option } => {
            let value = wifly.get_option(option)?;
            if args.json {
                let out = serde_json::json!({ "option": option, "value": value });
                println!("{out}");
            } else {
                println!("{value}");
            }
        }
        Command::Set { command, value } => {
            wifly.set_option(&command, value.as_deref())?;
            println!("AOK");
        }
        Command::Join { ssid } => {
            wifly.begin()?;
            wifly.join(ssid.as_deref())?;
            println!("associated");
        }
        Command::Leave => wifly.leave()?,
        Command::Open {
            host,
            port,
            send,
            wait_ms,
        } => {
            wifly.begin()?;
            wifly.open(&host, port, true)?;
            if let Some(line) = send {
                wifly.write_all(line.as_bytes())?;
                wifly.write_all(b"\r\n")?;
            }
            let reply = collect(&mut wifly, Duration::from_millis(wait_ms))?;
            io::stdout().write_all(&reply)?;
            wifly.close()?;
        }
        Command::Lookup { host } => {
            let addr = wifly.lookup(&host)?;
            if args.json {
                println!("{}", serde_json::json!({ "host": host, "address": addr }));
            } else {
                println!("{addr}");
            }
        }
        Command::Ping { host } => {
            wifly.begin()?;
            wifly.ping(&host)?;
            println!("{host} is alive");
        }
        Command::Save => wifly.save()?,
        Command::Reboot => wifly.reboot()?,
        Command::FactoryRestore => wifly.factory_restore()?,
        Command::Terminal { escape } => {
            let escape = u8::try_from(escape).map_err(|_| "escape must be an ASCII character")?;
            eprintln!("Terminal to {port_name}; type '{}' to quit.", char::from(escape));
            let mut console = StdioConsole::spawn();
            wifly.terminal(&mut console, escape)?;
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig, verbose: u8) {
    let level = match verbose {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Read payload until the connection closes or `window` passes.
fn collect<T: Transport>(wifly: &mut WiFly<T>, window: Duration) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + window;
    let mut reply = Vec::new();
    let mut buf = [0u8; 256];
    while Instant::now() < deadline {
        match wifly.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => reply.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(e),
        }
    }
    debug!(bytes = reply.len(), "collected reply");
    Ok(reply)
}

/// Stdin/stdout as a transport. Stdin is read on a helper thread so polling
/// never blocks.
#[derive(Debug)]
struct StdioConsole {
    input: Receiver<u8>,
    pending: Option<u8>,
}

impl StdioConsole {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for byte in io::stdin().lock().bytes() {
                let Ok(byte) = byte else { break };
                if tx.send(byte).is_err() {
                    break;
                }
            }
        });
        Self {
            input: rx,
            pending: None,
        }
    }

    fn fill(&mut self) -> Result<(), PortError> {
        if self.pending.is_none() {
            match self.input.try_recv() {
                Ok(byte) => self.pending = Some(byte),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    return Err(PortError::fault("console input closed"))
                }
            }
        }
        Ok(())
    }
}

impl Transport for StdioConsole {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut out = io::stdout().lock();
        out.write_all(data)?;
        out.flush()?;
        Ok(data.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, PortError> {
        self.fill()?;
        Ok(self.pending.take())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, PortError> {
        self.fill()?;
        Ok(self.pending)
    }

    fn bytes_available(&mut self) -> Result<usize, PortError> {
        self.fill()?;
        Ok(usize::from(self.pending.is_some()))
    }

    fn flush(&mut self) -> Result<(), PortError> {
        io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stdio"
    }
}
