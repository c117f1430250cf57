//! Runs a parsed instruction tree against market data.

use tracing::info;

use crate::domain::context::Context;
use crate::domain::error::DslError;
use crate::domain::instruction::Instruction;
use crate::ports::market_data_port::MarketDataPort;

pub struct Interpreter {
    root: Instruction,
    port: Box<dyn MarketDataPort>,
    context: Context,
}

impl Interpreter {
    pub fn new(root: Instruction, port: Box<dyn MarketDataPort>) -> Self {
        Self {
            root,
            port,
            context: Context::new(),
        }
    }

    /// Fetch series from the port and merge them into the context.
    /// Every call fetches again.
    pub fn load_market_data(
        &mut self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<(), DslError> {
        info!(symbol, interval, limit, "loading market data");
        let data = self
            .port
            .fetch(symbol, interval, limit)
            .map_err(|source| DslError::MarketData {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
                source,
            })?;
        info!(series = data.len(), "market data loaded");
        self.context.update(data);
        Ok(())
    }

    /// Execute the tree once. Mutations made before a failure are kept.
    pub fn run(&mut self) -> Result<(), DslError> {
        info!("strategy run started");
        self.root.execute(&mut self.context)?;
        info!(trades = self.context.trades().len(), "strategy run finished");
        Ok(())
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}
