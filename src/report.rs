use serde::Serialize;
use serde_json::json;
use serde_sarif::sarif::{
    Edge, Graph, Invocation, Location, LogicalLocation, Message, Node, Run, Sarif, Tool,
    ToolComponent, SCHEMA_URL,
};

use crate::driver::Construction;
use crate::ir::{CallKind, MethodSignature};

/// Plain JSON rendering of a call graph.
#[derive(Serialize)]
pub struct GraphReport<'a> {
    pub complete: bool,
    pub nodes: Vec<&'a MethodSignature>,
    pub edges: Vec<EdgeReport<'a>>,
}

#[derive(Serialize)]
pub struct EdgeReport<'a> {
    pub caller: &'a MethodSignature,
    pub callee: &'a MethodSignature,
    pub kinds: Vec<CallKind>,
}

pub fn graph_report(construction: &Construction) -> GraphReport<'_> {
    GraphReport {
        complete: construction.complete,
        nodes: construction.graph.nodes().collect(),
        edges: construction
            .graph
            .edges()
            .map(|(caller, callee)| EdgeReport {
                caller,
                callee,
                kinds: construction.call_kinds(caller, callee).collect(),
            })
            .collect(),
    }
}

pub fn build_invocation() -> Invocation {
    let arguments: Vec<String> = std::env::args().collect();
    let command_line = arguments.join(" ");

    Invocation::builder()
        .execution_successful(true)
        .arguments(arguments)
        .command_line(command_line)
        .build()
}

pub fn build_sarif(construction: &Construction, invocation: Invocation) -> Sarif {
    let driver = ToolComponent::builder().name("chagraph").build();
    let tool = Tool {
        driver,
        extensions: None,
        properties: None,
    };
    let run = Run::builder()
        .tool(tool)
        .invocations(vec![invocation])
        .results(Vec::new())
        .graphs(vec![call_graph(construction)])
        .build();

    Sarif::builder()
        .schema(SCHEMA_URL)
        .runs(vec![run])
        .version(json!("2.1.0"))
        .build()
}

fn call_graph(construction: &Construction) -> Graph {
    let graph = &construction.graph;
    let nodes: Vec<Node> = graph
        .nodes()
        .map(|method| {
            Node::builder()
                .id(method.to_string())
                .location(method_location(method))
                .build()
        })
        .collect();
    let edges: Vec<Edge> = graph
        .edges()
        .enumerate()
        .map(|(index, (caller, callee))| {
            let kinds: Vec<&str> = construction
                .call_kinds(caller, callee)
                .map(CallKind::as_str)
                .collect();
            Edge::builder()
                .id(format!("e{index}"))
                .label(message(kinds.join(",")))
                .source_node_id(caller.to_string())
                .target_node_id(callee.to_string())
                .build()
        })
        .collect();

    Graph::builder()
        .description(message("CHA call graph"))
        .nodes(nodes)
        .edges(edges)
        .build()
}

fn method_location(method: &MethodSignature) -> Location {
    let logical = LogicalLocation::builder()
        .name(method.sub.name.as_str())
        .fully_qualified_name(method.to_string())
        .kind("function")
        .build();
    Location::builder().logical_locations(vec![logical]).build()
}

fn message(text: impl Into<String>) -> Message {
    Message::builder().text(text.into()).build()
}
