//! `dok svc <service>`: tasks and containers of a swarm service.
use crate::commands::CONTAINER_COLUMNS;
use crate::dispatch::{Command, CommandError, Context};
use crate::table::{print_table, print_title, Column};

/// Columns of the service task table.
pub const TASK_COLUMNS: [Column; 5] = [
    Column::fixed("TASK", "TASK", 25),
    Column::fixed("NODE", "NODE", 20),
    Column::fixed("DESIRED", "DESIRED", 12),
    Column::fixed("CURRENT", "CURRENT", 30),
    Column::fixed("PORTS", "PORTS", 20),
];

/// `dok svc`
pub struct Svc;

impl Command for Svc {
    fn name(&self) -> &'static str {
        "svc"
    }

    fn description(&self) -> &'static str {
        "Inspect a Swarm service (tasks + containers)"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok svc <service>")
    }

    fn run(&self, ctx: &mut Context<'_>, args: &[String]) -> Result<i32, CommandError> {
        let Some(service) = args.first() else {
            return Err(CommandError::MissingArgument {
                what: "service name",
                usage: self.usage(),
            });
        };
        let engine = ctx.engine();

        let tasks = engine.service_tasks(service)?;
        print_title(ctx.console, &format!("Service: {service} - Tasks"));
        print_table(ctx.console, &tasks, &TASK_COLUMNS);

        let containers = engine.service_containers(service)?;
        print_title(ctx.console, &format!("Service: {service} - Containers"));
        print_table(ctx.console, &containers, &CONTAINER_COLUMNS);
        Ok(0)
    }
}
