use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "naivechain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a node")]
    StartNode {
        #[arg(long = "p2p", help = "Peer protocol listen address")]
        p2p: Option<String>,
        #[arg(long = "control", help = "Control interface listen address")]
        control: Option<String>,
        #[arg(long = "peer", help = "Peer to dial at startup (repeatable)")]
        peers: Vec<String>,
    },
    #[command(name = "blocks", about = "Print the chain of a running node")]
    Blocks {
        #[arg(long = "control", help = "Control address of the node")]
        control: Option<String>,
    },
    #[command(name = "mine", about = "Mine a block carrying DATA on a running node")]
    Mine {
        #[arg(help = "Block payload")]
        data: String,
        #[arg(long = "control", help = "Control address of the node")]
        control: Option<String>,
    },
    #[command(name = "peers", about = "List the peers of a running node")]
    Peers {
        #[arg(long = "control", help = "Control address of the node")]
        control: Option<String>,
    },
    #[command(name = "addpeer", about = "Connect a running node to ADDR")]
    AddPeer {
        #[arg(help = "Peer protocol address to dial")]
        addr: String,
        #[arg(long = "control", help = "Control address of the node")]
        control: Option<String>,
    },
    #[command(name = "genesis", about = "Print the genesis block")]
    Genesis,
}
