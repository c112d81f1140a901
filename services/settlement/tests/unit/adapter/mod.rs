mod rpc;
