use bloatcache::memcache::cli::parser::RuntimeType;

pub struct BloatcachedServerParamsBuilder {
    runtime: RuntimeType,
    port: u16,
    threads: usize,
    max_item_size: Option<String>,
    connection_limit: Option<u32>,
}

#[allow(dead_code)]
impl BloatcachedServerParamsBuilder {
    pub fn new() -> BloatcachedServerParamsBuilder {
        BloatcachedServerParamsBuilder {
            runtime: RuntimeType::CurrentThread,
            port: 8081,
            threads: 2,
            max_item_size: None,
            connection_limit: None,
        }
    }

    pub fn with_runtime(&mut self, runtime: RuntimeType) -> &mut Self {
        self.runtime = runtime;
        self
    }

    pub fn with_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    pub fn with_max_item_size(&mut self, max_item_size: &str) -> &mut Self {
        self.max_item_size = Some(String::from(max_item_size));
        self
    }

    pub fn with_connection_limit(&mut self, connection_limit: u32) -> &mut Self {
        self.connection_limit = Some(connection_limit);
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut result: Vec<String> = vec![String::from("bloatcached")];
        result.push(String::from("--listen"));
        result.push(String::from("127.0.0.1"));

        result.push(String::from("--runtime-type"));
        match self.runtime {
            RuntimeType::CurrentThread => result.push(String::from("current-thread")),
            RuntimeType::MultiThread => result.push(String::from("multi-thread")),
        }

        result.push(String::from("--port"));
        result.push(self.port.to_string());

        result.push(String::from("--threads"));
        result.push(self.threads.to_string());

        if let Some(max_item_size) = &self.max_item_size {
            result.push(String::from("--max-item-size"));
            result.push(max_item_size.clone());
        }

        if let Some(connection_limit) = self.connection_limit {
            result.push(String::from("--connection-limit"));
            result.push(connection_limit.to_string());
        }
        // result.push(String::from("-vvv"));
        result
    }
}
