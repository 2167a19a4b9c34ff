use clap::Parser;
use log::error;
use naivechain::{
    send_request, Block, Command, ControlServer, Node, Opt, Peers, Request, Response, Server,
    SyncEngine, GLOBAL_CONFIG,
};
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode { p2p, control, peers } => {
            if let Some(addr) = p2p {
                GLOBAL_CONFIG.set_p2p_addr(addr);
            }
            if let Some(addr) = control {
                GLOBAL_CONFIG.set_control_addr(addr);
            }
            if !peers.is_empty() {
                GLOBAL_CONFIG.set_initial_peers(&peers);
            }
            start_node()?;
        }
        Command::Blocks { control } => {
            print_response(send_request(&control_addr(control), &Request::Blocks)?)?;
        }
        Command::Mine { data, control } => {
            print_response(send_request(&control_addr(control), &Request::Mine { data })?)?;
        }
        Command::Peers { control } => {
            print_response(send_request(&control_addr(control), &Request::Peers)?)?;
        }
        Command::AddPeer { addr, control } => {
            print_response(send_request(
                &control_addr(control),
                &Request::AddPeer { addr },
            )?)?;
        }
        Command::Genesis => {
            println!("{}", serde_json::to_string_pretty(&Block::genesis())?);
        }
    }
    Ok(())
}

fn start_node() -> Result<(), Box<dyn std::error::Error>> {
    let peers = Arc::new(Peers::new());
    let node = Arc::new(Node::new(peers));
    let engine = Arc::new(SyncEngine::new(Arc::clone(&node)));
    let p2p = Server::new(engine);

    p2p.run(&GLOBAL_CONFIG.get_p2p_addr())?;
    p2p.connect_to_peers(&GLOBAL_CONFIG.get_initial_peers());

    let control = ControlServer::new(node, p2p);
    control.run(&GLOBAL_CONFIG.get_control_addr())?;
    Ok(())
}

fn control_addr(control: Option<String>) -> String {
    control.unwrap_or_else(|| GLOBAL_CONFIG.get_control_addr())
}

fn print_response(response: Response) -> Result<(), Box<dyn std::error::Error>> {
    if let Response::Error { kind, message } = &response {
        return Err(format!("{kind:?} error: {message}").into());
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
